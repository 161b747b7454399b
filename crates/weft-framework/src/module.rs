//! Module container.
//!
//! A [`Module`] is a named, addable/removable unit grouping related command
//! and listener registrations, with optional async `setup` / `teardown`
//! lifecycle hooks. Modules are built with plain builder calls, with no
//! base class and no registration macro:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_core::{BoxError, Context, EventKind};
//! use weft_framework::{Module, command::CommandInvocation};
//!
//! async fn hello(ctx: Arc<Context>, _inv: CommandInvocation) -> Result<(), BoxError> {
//!     ctx.reply_text("Hello, world!").await?;
//!     Ok(())
//! }
//!
//! async fn on_follow(ctx: Arc<Context>) -> Result<(), BoxError> {
//!     ctx.reply_text("Thanks for adding me!").await?;
//!     Ok(())
//! }
//!
//! let module = Module::new("greetings")
//!     .command("hello", hello)
//!     .listener(EventKind::Follow, on_follow)
//!     .on_setup(|host| async move {
//!         tracing::info!(module = host.module_name(), "ready");
//!         Ok(())
//!     });
//! ```
//!
//! Setup runs once when the module is added and must succeed before the
//! module becomes active. Teardown runs once at removal, best-effort: its
//! failure is logged by the caller, never propagated, and removal still
//! takes effect.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use weft_core::{BoxError, BoxedApi, EventKind};

use crate::handler::{BoxedCommandHandler, BoxedEventHandler, CommandHandler, EventHandler};

/// The capability view handed to a module's lifecycle hooks.
///
/// Gives hooks the outbound messaging capability (e.g. to announce startup
/// with a push) and the module's own name for logging.
#[derive(Clone)]
pub struct ModuleHost {
    api: BoxedApi,
    module: Arc<str>,
}

impl ModuleHost {
    pub(crate) fn new(api: BoxedApi, module: Arc<str>) -> Self {
        Self { api, module }
    }

    /// The messaging API capability.
    pub fn api(&self) -> &BoxedApi {
        &self.api
    }

    /// The name of the module the hook belongs to.
    pub fn module_name(&self) -> &str {
        &self.module
    }
}

type LifecycleHook = Box<dyn Fn(ModuleHost) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// A named group of handler registrations plus lifecycle hooks.
pub struct Module {
    name: Arc<str>,
    commands: Vec<(String, BoxedCommandHandler)>,
    listeners: Vec<(EventKind, BoxedEventHandler)>,
    setup: Option<LifecycleHook>,
    teardown: Option<LifecycleHook>,
}

impl Module {
    /// Creates an empty module with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            listeners: Vec::new(),
            setup: None,
            teardown: None,
        }
    }

    /// The module's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Binds a command name to a handler.
    pub fn command<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        self.commands.push((name.into(), Arc::new(handler)));
        self
    }

    /// Adds a listener for an event kind. Listeners run alongside any other
    /// listeners registered for the same kind.
    pub fn listener<H>(mut self, kind: EventKind, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.listeners.push((kind, Arc::new(handler)));
        self
    }

    /// Sets the setup hook, run once when the module is added. The module
    /// only becomes active if the hook returns `Ok`.
    pub fn on_setup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModuleHost) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.setup = Some(Box::new(move |host| Box::pin(hook(host))));
        self
    }

    /// Sets the teardown hook, run once at removal, best-effort.
    pub fn on_teardown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModuleHost) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.teardown = Some(Box::new(move |host| Box::pin(hook(host))));
        self
    }

    pub(crate) async fn run_setup(&self, host: ModuleHost) -> Result<(), BoxError> {
        match &self.setup {
            Some(hook) => hook(host).await,
            None => Ok(()),
        }
    }

    pub(crate) async fn run_teardown(&self, host: ModuleHost) -> Result<(), BoxError> {
        match &self.teardown {
            Some(hook) => hook(host).await,
            None => Ok(()),
        }
    }

    /// Clones out this module's registrations for the registry.
    pub(crate) fn registrations(
        &self,
    ) -> (
        Vec<(String, BoxedCommandHandler)>,
        Vec<(EventKind, BoxedEventHandler)>,
    ) {
        (self.commands.clone(), self.listeners.clone())
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("commands", &self.commands.len())
            .field("listeners", &self.listeners.len())
            .field("has_setup", &self.setup.is_some())
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}
