//! # Weft Runtime
//!
//! Process-level glue for the Weft bot framework: layered configuration
//! (file + environment via figment), tracing-based logging setup, and a
//! [`Runtime`] that owns the [`Bot`](weft_framework::Bot) and drains it
//! gracefully on shutdown.
//!
//! The webhook HTTP server is not part of this crate; whatever receives and
//! verifies deliveries calls `runtime.bot().handle_webhook(body)`.

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigLoader, WeftConfig};
pub use error::{ConfigError, ConfigResult, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};
pub use runtime::Runtime;
