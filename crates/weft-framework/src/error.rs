//! Registration-time error types.
//!
//! Dispatch-time errors ([`DispatchError`], [`HandlerError`]) live in
//! [`crate::dispatcher`], next to the machinery that produces them.
//!
//! [`DispatchError`]: crate::dispatcher::DispatchError
//! [`HandlerError`]: crate::dispatcher::HandlerError

use thiserror::Error;

use weft_core::BoxError;

/// A registration that the registry refused.
///
/// Fatal only to the registration call that triggered it; existing
/// registrations are never affected.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The command name is already bound by a different module.
    #[error("command '{name}' is already registered by module '{owner}'")]
    DuplicateCommand {
        /// The contested command name.
        name: String,
        /// The module that holds the existing binding.
        owner: String,
    },
}

/// A failed `add_module` call.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A registration conflict. The module's setup had already run, so its
    /// teardown was invoked before this was returned.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The module's setup hook failed; nothing was registered.
    #[error("setup for module '{module}' failed: {source}")]
    Setup {
        /// The module's name.
        module: String,
        /// The error the hook returned.
        source: BoxError,
    },
}
