//! # Weft Framework
//!
//! The dispatch pipeline of the Weft bot framework: command parsing, the
//! handler registry, the module container, the dispatcher, and the
//! application-facing [`Bot`].
//!
//! ```text
//! raw body ──▶ event model ──▶ dispatcher ──▶ registry lookup
//!                                   │
//!                                   ├─▶ command handler ─┐  one task each,
//!                                   ├─▶ listener         ├─ joined before the
//!                                   └─▶ listener        ─┘  event completes
//! ```
//!
//! Handlers are plain async functions. Related handlers are grouped into
//! [`Module`]s that can be added and removed as a unit, with async
//! setup/teardown hooks. Each event gets a fresh
//! [`Context`](weft_core::Context); a handler that fails is isolated,
//! tagged, and reported without disturbing its siblings or the intake path.

pub mod bot;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod module;
pub mod registry;

pub use bot::{Bot, BotBuilder, STANDALONE_OWNER};
pub use command::{ArgError, CommandInvocation, parse_command};
pub use dispatcher::{
    DispatchConfig, DispatchError, Dispatcher, EventReport, HandlerError, HandlerFailure, Trigger,
    UnknownCommandPolicy,
};
pub use error::{ModuleError, RegistryError};
pub use handler::{
    BoxedCommandHandler, BoxedEventHandler, CommandHandler, EventHandler, HandlerFuture,
};
pub use module::{Module, ModuleHost};
pub use registry::{Registry, ResolvedCommand, ResolvedListener};
