//! Messaging API capability.
//!
//! The outbound side of the platform (reply, push, loading animation) is an
//! external collaborator. This module defines the [`MessagingApi`] trait the
//! rest of the framework calls through, and the [`ApiError`] taxonomy those
//! calls surface. Concrete HTTP clients (and test doubles) implement the
//! trait; the framework never retries on their behalf.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::ReplyToken;
use crate::message::OutgoingMessage;

/// Result type for messaging API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// A failed messaging API call.
///
/// Status-code variants follow the platform's documented responses. These are
/// surfaced to the handler that made the call and never retried by the core.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The reply token is invalid, expired, or was already used.
    #[error("reply token is invalid, expired, or already used")]
    InvalidReplyToken,

    /// 429: request rate limit exceeded.
    #[error("429: too many requests, rate limit exceeded")]
    RateLimited {
        /// Seconds to wait before retrying, when the platform says.
        retry_after: Option<u64>,
    },

    /// 400: problem with the request body or parameters.
    #[error("400: there was a problem with the request parameters or JSON format")]
    BadRequest,

    /// 401: the channel access token is missing or wrong.
    #[error("401: check that the authorization header is correct")]
    Unauthorized,

    /// 403: the account or plan is not authorized for this API.
    #[error("403: the account or plan is not authorized to use the API")]
    Forbidden,

    /// 413: request body exceeds the 2 MB limit.
    #[error("413: request exceeds the max size of 2MB")]
    PayloadTooLarge,

    /// 5xx: temporary error on the API server.
    #[error("{code}: temporary error on the API server")]
    Server {
        /// The HTTP status code.
        code: u16,
    },

    /// The call never reached the platform (connection, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Maps an HTTP status code to an error, or `None` for success codes.
    pub fn from_status(code: u16) -> Option<Self> {
        match code {
            200..=299 => None,
            400 => Some(ApiError::BadRequest),
            401 => Some(ApiError::Unauthorized),
            403 => Some(ApiError::Forbidden),
            413 => Some(ApiError::PayloadTooLarge),
            429 => Some(ApiError::RateLimited { retry_after: None }),
            500..=599 => Some(ApiError::Server { code }),
            other => Some(ApiError::Transport(format!(
                "unexpected status code {other}"
            ))),
        }
    }
}

/// The outbound-call capability of the messaging platform.
///
/// One instance is shared by every [`Context`](crate::context::Context) the
/// dispatcher creates. Implementations must be safe to call concurrently
/// from many handler tasks.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Sends a reply bound to an inbound event's reply token.
    ///
    /// Tokens are single-use and short-lived; the platform rejects reuse
    /// with [`ApiError::InvalidReplyToken`].
    async fn reply_message(
        &self,
        reply_token: &ReplyToken,
        messages: Vec<OutgoingMessage>,
    ) -> ApiResult<()>;

    /// Sends messages to a user, group, or room outside the reply window.
    async fn push_message(&self, to: &str, messages: Vec<OutgoingMessage>) -> ApiResult<()>;

    /// Shows a typing/loading animation in a one-on-one chat for the given
    /// number of seconds.
    async fn show_loading_animation(&self, chat_id: &str, seconds: u8) -> ApiResult<()>;
}

/// A shared, type-erased messaging API handle.
pub type BoxedApi = Arc<dyn MessagingApi>;
