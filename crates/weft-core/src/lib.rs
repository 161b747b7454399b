//! # Weft Core
//!
//! Foundation types for the Weft bot framework: the webhook event model, the
//! outbound message model, the [`MessagingApi`] capability trait, and the
//! per-event [`Context`].
//!
//! Everything here is I/O-free. The HTTP webhook receiver (with signature
//! verification) and the HTTP messaging client are external collaborators:
//! the receiver hands a validated body to the dispatcher in `weft-framework`,
//! and outbound calls go through whatever [`MessagingApi`] implementation
//! the application wires in.
//!
//! ```text
//! ┌──────────────┐  raw body   ┌────────────┐  Context   ┌───────────┐
//! │ webhook      │────────────▶│ dispatcher │───────────▶│  handler  │
//! │ receiver     │             │ (framework)│───────────▶│  handler  │
//! └──────────────┘             └────────────┘            └─────┬─────┘
//!                                                             │ reply/push
//!                                                      ┌──────▼───────┐
//!                                                      │ MessagingApi │
//!                                                      └──────────────┘
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod event;
pub mod message;

pub use api::{ApiError, ApiResult, BoxedApi, MessagingApi};
pub use context::{Context, MAX_MESSAGES_PER_CALL};
pub use error::{BoxError, OutboundError, ParseError};
pub use event::{
    Beacon, Event, EventKind, EventPayload, MessageContent, Postback, ReplyToken, Source,
    WebhookPayload, parse_payload,
};
pub use message::OutgoingMessage;
