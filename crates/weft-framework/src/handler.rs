//! Handler traits.
//!
//! Handlers are plain async functions or closures; the [`CommandHandler`]
//! and [`EventHandler`] traits are blanket-implemented for them, so
//! registration sites take the function directly:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_core::{BoxError, Context};
//! use weft_framework::command::CommandInvocation;
//!
//! async fn hello(ctx: Arc<Context>, _inv: CommandInvocation) -> Result<(), BoxError> {
//!     ctx.reply_text("Hello, world!").await?;
//!     Ok(())
//! }
//!
//! let module = weft_framework::Module::new("example").command("hello", hello);
//! ```
//!
//! A handler signals failure by returning `Err`; the dispatcher catches it,
//! tags it with the handler's identity, and reports it without touching
//! sibling handlers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use weft_core::{BoxError, Context};

use crate::command::CommandInvocation;

/// The boxed future every handler call resolves to.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'static>>;

/// A handler bound to a command name. Receives the context and the parsed
/// invocation.
pub trait CommandHandler: Send + Sync {
    /// Invokes the handler for one event.
    fn call(&self, ctx: Arc<Context>, invocation: CommandInvocation) -> HandlerFuture;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn(Arc<Context>, CommandInvocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>, invocation: CommandInvocation) -> HandlerFuture {
        Box::pin(self(ctx, invocation))
    }
}

/// A handler bound to an event kind. Receives only the context.
pub trait EventHandler: Send + Sync {
    /// Invokes the handler for one event.
    fn call(&self, ctx: Arc<Context>) -> HandlerFuture;
}

impl<F, Fut> EventHandler for F
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>) -> HandlerFuture {
        Box::pin(self(ctx))
    }
}

/// A shared command handler, as stored in the registry.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// A shared event handler, as stored in the registry.
pub type BoxedEventHandler = Arc<dyn EventHandler>;
