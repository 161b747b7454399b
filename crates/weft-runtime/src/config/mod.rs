//! Configuration loading and schema.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{
    CommandConfig, DispatchSection, LogFormat, LogOutput, LoggingConfig, UnknownCommandMode,
    WeftConfig,
};
