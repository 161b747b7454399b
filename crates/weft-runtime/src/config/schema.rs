//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use weft_framework::{DispatchConfig, UnknownCommandPolicy};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeftConfig {
    /// Command parsing settings.
    #[serde(default)]
    pub command: CommandConfig,

    /// Dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WeftConfig {
    /// Builds the dispatcher configuration this file describes.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            prefix: self.command.prefix.clone(),
            unknown_command: match self.command.unknown {
                UnknownCommandMode::Fallthrough => UnknownCommandPolicy::Fallthrough,
                UnknownCommandMode::Reply => UnknownCommandPolicy::Reply {
                    template: self.command.unknown_reply.clone(),
                },
            },
            handler_timeout: self.dispatch.handler_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Command parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// The command prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// What to do with a prefixed message whose command is not bound.
    #[serde(default)]
    pub unknown: UnknownCommandMode,

    /// Notice text for `unknown = "reply"`. `{command}` is replaced by the
    /// unbound command name.
    #[serde(default = "default_unknown_reply")]
    pub unknown_reply: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            unknown: UnknownCommandMode::default(),
            unknown_reply: default_unknown_reply(),
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_unknown_reply() -> String {
    "Unknown command: {command}".to_string()
}

/// Unknown-command handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCommandMode {
    /// Treat the message as plain text; nothing is sent.
    #[default]
    Fallthrough,
    /// Reply with `unknown_reply`.
    Reply,
}

/// Dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DispatchSection {
    /// Per-handler timeout in milliseconds. Unset means no timeout.
    #[serde(default)]
    pub handler_timeout_ms: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `weft_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One compact line per event.
    #[default]
    Compact,
    /// The default `tracing_subscriber::fmt` format.
    Full,
    /// Multi-line human-friendly format.
    Pretty,
    /// JSON lines. Requires the `json-log` feature; falls back to compact
    /// without it.
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// A file, appended without rotation.
    File,
}
