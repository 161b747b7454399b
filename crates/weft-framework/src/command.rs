//! Command extraction from message text.
//!
//! A command is a text message that starts with the configured prefix. The
//! token right after the prefix is the command name; the remaining
//! whitespace-delimited tokens are its arguments.
//!
//! Parsing is total: text that is not a command yields `None`, never an
//! error. Quoted substrings are not treated specially: `!echo "a b"` has
//! the arguments `["\"a", "b\""]`. Name matching downstream is exact and
//! case-sensitive.

use std::any;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A command extracted from a message's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// The command name: first whitespace-delimited token after the prefix.
    pub name: String,
    /// The remaining whitespace-delimited tokens, in order.
    pub args: Vec<String>,
    /// The original message text, prefix included.
    pub raw: String,
}

impl CommandInvocation {
    /// Parses the argument at `index` into `T`.
    ///
    /// ```
    /// use weft_framework::command::parse_command;
    ///
    /// let inv = parse_command("!plus 2 40", "!").unwrap();
    /// let a: i64 = inv.arg(0).unwrap();
    /// let b: i64 = inv.arg(1).unwrap();
    /// assert_eq!(a + b, 42);
    /// ```
    pub fn arg<T>(&self, index: usize) -> Result<T, ArgError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.args.get(index).ok_or(ArgError::Missing { index })?;
        raw.parse().map_err(|err: T::Err| ArgError::Invalid {
            index,
            value: raw.clone(),
            target: any::type_name::<T>(),
            reason: err.to_string(),
        })
    }
}

/// A command argument that is absent or does not convert to the requested
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// No argument at that position.
    #[error("missing argument at position {index}")]
    Missing {
        /// Zero-based argument position.
        index: usize,
    },

    /// The argument exists but failed to convert.
    #[error("argument {index} ({value:?}) is not a valid {target}: {reason}")]
    Invalid {
        /// Zero-based argument position.
        index: usize,
        /// The raw token.
        value: String,
        /// Name of the requested type.
        target: &'static str,
        /// The conversion error.
        reason: String,
    },
}

/// Extracts a command from message text.
///
/// Returns `None` when `text` does not start with `prefix`, when it is
/// exactly the prefix, or when no name token follows the prefix.
pub fn parse_command(text: &str, prefix: &str) -> Option<CommandInvocation> {
    let rest = text.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?.to_owned();
    let args = tokens.map(str::to_owned).collect();
    Some(CommandInvocation {
        name,
        args,
        raw: text.to_owned(),
    })
}
