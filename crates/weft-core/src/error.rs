//! Core error types.
//!
//! Outbound-call errors live in [`crate::api`]; this module holds the parse
//! and context-level errors plus the boxed error alias user handlers return.

use thiserror::Error;

use crate::api::ApiError;

/// Boxed error type returned by user handler code.
///
/// Anything that is `Error + Send + Sync` converts into it with `?`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A webhook body that could not be parsed into events.
///
/// The delivery carrying it is rejected before any handler runs.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON, or a field has the wrong shape.
    #[error("invalid webhook JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required for the event's kind is absent.
    #[error("webhook payload is missing required field '{field}'")]
    MissingField {
        /// Dotted path of the missing field.
        field: &'static str,
    },

    /// A field is present but has an unusable type.
    #[error("webhook payload field '{field}' has an unexpected type")]
    InvalidField {
        /// Dotted path of the offending field.
        field: &'static str,
    },
}

/// Failure of an outbound operation made through a
/// [`Context`](crate::context::Context).
///
/// Local misuse (no reply token, oversized batch) is caught before the
/// messaging API is called; platform failures pass through as
/// [`OutboundError::Api`] untouched.
#[derive(Debug, Error)]
pub enum OutboundError {
    /// The event carries no reply token, so reply operations are impossible.
    #[error("event carries no reply token")]
    NoReplyToken,

    /// A reply or push may carry at most five messages.
    #[error("a reply or push may carry at most 5 messages, got {count}")]
    TooManyMessages {
        /// Number of messages in the rejected batch.
        count: usize,
    },

    /// The loading animation accepts 5 to 60 seconds.
    #[error("loading animation duration must be between 5 and 60 seconds, got {0}")]
    InvalidLoadingDuration(u8),

    /// The event has no user id to target.
    #[error("event has no user id to target")]
    NoUserId,

    /// The messaging API rejected or failed the call.
    #[error(transparent)]
    Api(#[from] ApiError),
}
