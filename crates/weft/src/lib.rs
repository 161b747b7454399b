//! # Weft
//!
//! An event-dispatch framework for LINE-style messaging bots.
//!
//! Weft turns validated webhook deliveries into typed events, routes them
//! through a registry of command handlers and event listeners, and hands
//! each handler a request-scoped [`Context`] that replies through the
//! platform's single-use reply tokens.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  body  ┌────────────┐ lookup ┌──────────┐
//! │ webhook      │───────▶│ Dispatcher │───────▶│ Registry │
//! │ receiver     │        └─────┬──────┘        └──────────┘
//! └──────────────┘              │ one task per handler
//!                         ┌─────▼─────┐  reply/push  ┌──────────────┐
//!                         │ handlers  │─────────────▶│ MessagingApi │
//!                         └───────────┘              └──────────────┘
//! ```
//!
//! - **weft-core**: event model, outbound messages, the [`MessagingApi`]
//!   capability, the per-event [`Context`].
//! - **weft-framework**: command parser, registry, [`Module`] container,
//!   dispatcher, and the application-facing [`Bot`].
//! - **weft-runtime**: figment configuration, tracing logging, graceful
//!   shutdown.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft::prelude::*;
//!
//! async fn hello(ctx: Arc<Context>, _inv: CommandInvocation) -> Result<(), BoxError> {
//!     ctx.reply_text("Hello, world!").await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> weft::RuntimeResult<()> {
//!     let api: BoxedApi = Arc::new(MyHttpClient::from_env());
//!     let runtime = Runtime::from_default_config(api)?;
//!     runtime.init_logging();
//!
//!     runtime
//!         .bot()
//!         .add_module(Module::new("greetings").command("hello", hello))
//!         .await?;
//!
//!     // wire runtime.bot().handle_webhook(..) into your webhook server
//!     runtime.run_until_shutdown().await
//! }
//! ```
//!
//! ## Features
//!
//! - `yaml-config`: YAML configuration files alongside TOML
//! - `json-log`: JSON log output format

pub use weft_core;
pub use weft_framework;
pub use weft_runtime;

pub use weft_core::{
    ApiError, ApiResult, BoxError, BoxedApi, Context, Event, EventKind, EventPayload,
    MessagingApi, OutboundError, OutgoingMessage, ParseError, ReplyToken, Source,
    WebhookPayload, parse_payload,
};
pub use weft_framework::{
    Bot, CommandInvocation, DispatchConfig, DispatchError, EventReport, HandlerFailure, Module,
    ModuleError, RegistryError, UnknownCommandPolicy, parse_command,
};
pub use weft_runtime::{ConfigLoader, Runtime, RuntimeError, RuntimeResult, WeftConfig};

/// Prelude for common imports.
pub mod prelude {
    pub use weft_core::{
        BoxError, BoxedApi, Context, Event, EventKind, EventPayload, MessagingApi,
        OutgoingMessage,
    };
    pub use weft_framework::{Bot, CommandInvocation, Module, UnknownCommandPolicy};
    pub use weft_runtime::{Runtime, WeftConfig};
}
