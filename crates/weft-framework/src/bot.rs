//! The application-facing bot object.
//!
//! [`Bot`] owns the [`Registry`], the [`Dispatcher`], the module table, and
//! the shared [`MessagingApi`](weft_core::MessagingApi) handle. It is
//! constructed explicitly by the process entry point and passed by
//! reference; there is no hidden global instance.
//!
//! ```rust,ignore
//! let bot = Bot::builder(api)
//!     .prefix("!")
//!     .build();
//! bot.add_module(greetings_module()).await?;
//!
//! // From the webhook receiver, per validated delivery:
//! bot.handle_webhook(&body).await?;
//!
//! // On shutdown:
//! bot.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

use weft_core::{BoxedApi, Event, EventKind};

use crate::dispatcher::{
    DispatchConfig, DispatchError, Dispatcher, EventReport, HandlerFailure, UnknownCommandPolicy,
};
use crate::error::{ModuleError, RegistryError};
use crate::handler::{CommandHandler, EventHandler};
use crate::module::{Module, ModuleHost};
use crate::registry::Registry;

/// Owner name used for registrations made outside any module.
pub const STANDALONE_OWNER: &str = "<standalone>";

/// Builder for [`Bot`].
pub struct BotBuilder {
    api: BoxedApi,
    config: DispatchConfig,
    failures: Option<mpsc::UnboundedSender<HandlerFailure>>,
}

impl BotBuilder {
    /// Sets the command prefix (default `"!"`).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Sets the policy for prefixed messages with no bound command.
    pub fn unknown_command(mut self, policy: UnknownCommandPolicy) -> Self {
        self.config.unknown_command = policy;
        self
    }

    /// Sets a per-handler timeout.
    pub fn handler_timeout(mut self, timeout: Duration) -> Self {
        self.config.handler_timeout = Some(timeout);
        self
    }

    /// Replaces the whole dispatch configuration.
    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a channel that receives every handler failure.
    pub fn failure_channel(mut self, sender: mpsc::UnboundedSender<HandlerFailure>) -> Self {
        self.failures = Some(sender);
        self
    }

    /// Builds the bot.
    pub fn build(self) -> Bot {
        let registry = Arc::new(Registry::new());
        let mut dispatcher =
            Dispatcher::new(Arc::clone(&registry), Arc::clone(&self.api), self.config);
        if let Some(sender) = self.failures {
            dispatcher.set_failure_channel(sender);
        }
        Bot {
            api: self.api,
            registry,
            dispatcher,
            modules: Mutex::new(Vec::new()),
        }
    }
}

/// A configured bot: registry, dispatcher, and module lifecycle in one place.
pub struct Bot {
    api: BoxedApi,
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
    /// Modules in add order; torn down in reverse on shutdown.
    modules: Mutex<Vec<(Arc<str>, Arc<Module>)>>,
}

impl Bot {
    /// Starts building a bot over the given outbound capability.
    pub fn builder(api: BoxedApi) -> BotBuilder {
        BotBuilder {
            api,
            config: DispatchConfig::default(),
            failures: None,
        }
    }

    /// A bot with default configuration.
    pub fn new(api: BoxedApi) -> Self {
        Self::builder(api).build()
    }

    /// The outbound capability this bot calls through.
    pub fn api(&self) -> &BoxedApi {
        &self.api
    }

    /// The handler registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Adds a module: runs its setup hook, then registers everything it owns
    /// in one atomic step.
    ///
    /// Setup must succeed before the module becomes active. A duplicate
    /// command name fails the whole call and leaves existing registrations
    /// untouched; the module's teardown is invoked (best-effort) since its
    /// setup had already run. Re-adding a module under the same name
    /// replaces it.
    pub async fn add_module(&self, module: Module) -> Result<(), ModuleError> {
        let module = Arc::new(module);
        let name = module.name_arc();

        let host = ModuleHost::new(Arc::clone(&self.api), Arc::clone(&name));
        module
            .run_setup(host)
            .await
            .map_err(|source| ModuleError::Setup {
                module: name.to_string(),
                source,
            })?;

        let (commands, listeners) = module.registrations();
        if let Err(err) = self.registry.register_module(&name, commands, listeners) {
            let host = ModuleHost::new(Arc::clone(&self.api), Arc::clone(&name));
            if let Err(teardown_err) = module.run_teardown(host).await {
                warn!(
                    module = %name,
                    error = %teardown_err,
                    "teardown after rejected registration also failed"
                );
            }
            return Err(err.into());
        }

        let mut modules = self.modules.lock();
        if let Some(slot) = modules.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = module;
        } else {
            modules.push((Arc::clone(&name), module));
        }
        drop(modules);

        info!(module = %name, "module added");
        Ok(())
    }

    /// Removes a module: unregisters everything it owns atomically, then
    /// runs its teardown hook best-effort.
    ///
    /// Removal takes effect even when teardown fails (the failure is
    /// logged). Idempotent: removing an unknown module returns `false`.
    pub async fn remove_module(&self, name: &str) -> bool {
        let entry = {
            let mut modules = self.modules.lock();
            modules
                .iter()
                .position(|(existing, _)| existing.as_ref() == name)
                .map(|index| modules.remove(index))
        };

        let Some((owner, module)) = entry else {
            return false;
        };

        let removed = self.registry.unregister_module(name);
        let host = ModuleHost::new(Arc::clone(&self.api), Arc::clone(&owner));
        if let Err(err) = module.run_teardown(host).await {
            warn!(module = %name, error = %err, "module teardown failed");
        }
        info!(module = %name, registrations = removed, "module removed");
        true
    }

    /// Registers a single command handler outside any module.
    pub fn register_command<H>(
        &self,
        name: impl Into<String>,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: CommandHandler + 'static,
    {
        self.registry
            .register_command(name, STANDALONE_OWNER, Arc::new(handler))
    }

    /// Registers a single listener outside any module.
    pub fn register_listener<H>(&self, kind: EventKind, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.registry
            .register_listener(kind, STANDALONE_OWNER, Arc::new(handler));
    }

    /// Dispatches one raw, already-authenticated webhook body.
    pub async fn handle_webhook(&self, raw: &str) -> Result<Vec<EventReport>, DispatchError> {
        self.dispatcher.dispatch(raw).await
    }

    /// Dispatches one already-parsed event.
    pub async fn dispatch_event(&self, event: Event) -> Result<EventReport, DispatchError> {
        self.dispatcher.dispatch_event(event).await
    }

    /// Shuts the bot down: rejects new payloads, drains in-flight handlers,
    /// then tears modules down in reverse add order.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;

        let modules: Vec<(Arc<str>, Arc<Module>)> = {
            let mut modules = self.modules.lock();
            let mut drained: Vec<_> = modules.drain(..).collect();
            drained.reverse();
            drained
        };

        for (name, module) in modules {
            self.registry.unregister_module(&name);
            let host = ModuleHost::new(Arc::clone(&self.api), Arc::clone(&name));
            if let Err(err) = module.run_teardown(host).await {
                warn!(module = %name, error = %err, "module teardown failed during shutdown");
            }
        }
        info!("bot shut down");
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("modules", &self.modules.lock().len())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    use weft_core::{
        ApiResult, BoxError, Context, MessagingApi, OutgoingMessage, ReplyToken,
    };

    use crate::command::CommandInvocation;

    struct NullApi;

    #[async_trait]
    impl MessagingApi for NullApi {
        async fn reply_message(
            &self,
            _reply_token: &ReplyToken,
            _messages: Vec<OutgoingMessage>,
        ) -> ApiResult<()> {
            Ok(())
        }

        async fn push_message(&self, _to: &str, _messages: Vec<OutgoingMessage>) -> ApiResult<()> {
            Ok(())
        }

        async fn show_loading_animation(&self, _chat_id: &str, _seconds: u8) -> ApiResult<()> {
            Ok(())
        }
    }

    fn bot() -> Bot {
        Bot::new(Arc::new(NullApi))
    }

    async fn noop_command(_ctx: Arc<Context>, _inv: CommandInvocation) -> Result<(), BoxError> {
        Ok(())
    }

    async fn noop_listener(_ctx: Arc<Context>) -> Result<(), BoxError> {
        Ok(())
    }

    fn message_body(text: &str) -> String {
        json!({ "events": [{
            "type": "message",
            "timestamp": 1,
            "source": { "type": "user", "userId": "U1" },
            "replyToken": "tok",
            "message": { "id": "1", "type": "text", "text": text }
        }]})
        .to_string()
    }

    #[tokio::test]
    async fn add_module_runs_setup_before_registering() {
        let bot = bot();
        let order = Arc::new(StdMutex::new(Vec::<&'static str>::new()));

        let trace = Arc::clone(&order);
        let module = Module::new("greetings")
            .command("hello", noop_command)
            .on_setup(move |_host| {
                let trace = Arc::clone(&trace);
                async move {
                    trace.lock().unwrap().push("setup");
                    Ok(())
                }
            });

        bot.add_module(module).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["setup"]);
        assert!(bot.registry().resolve("hello").is_some());
    }

    #[tokio::test]
    async fn duplicate_command_fails_the_whole_add_and_tears_down() {
        let bot = bot();
        bot.add_module(Module::new("first").command("hello", noop_command))
            .await
            .unwrap();

        let torn_down = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&torn_down);
        let second = Module::new("second")
            .command("fresh", noop_command)
            .command("hello", noop_command)
            .on_teardown(move |_host| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });

        match bot.add_module(second).await {
            Err(ModuleError::Registry(RegistryError::DuplicateCommand { name, owner })) => {
                assert_eq!(name, "hello");
                assert_eq!(owner, "first");
            }
            other => panic!("expected duplicate command error, got {other:?}"),
        }

        // Nothing from the failed module leaked in, and its teardown ran.
        assert!(bot.registry().resolve("fresh").is_none());
        assert_eq!(bot.registry().owned_by("second"), 0);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
        // The first module is untouched.
        assert!(bot.registry().resolve("hello").is_some());
    }

    #[tokio::test]
    async fn failed_setup_registers_nothing() {
        let bot = bot();
        let module = Module::new("broken")
            .command("never", noop_command)
            .on_setup(|_host| async { Err::<(), BoxError>("db unreachable".into()) });

        match bot.add_module(module).await {
            Err(ModuleError::Setup { module, .. }) => assert_eq!(module, "broken"),
            other => panic!("expected setup error, got {other:?}"),
        }
        assert!(bot.registry().resolve("never").is_none());
    }

    #[tokio::test]
    async fn remove_module_is_idempotent_and_runs_teardown() {
        let bot = bot();
        let torn_down = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&torn_down);

        bot.add_module(
            Module::new("temp")
                .command("cmd", noop_command)
                .listener(EventKind::Follow, noop_listener)
                .on_teardown(move |_host| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
        )
        .await
        .unwrap();

        assert!(bot.remove_module("temp").await);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
        assert_eq!(bot.registry().owned_by("temp"), 0);

        // Second removal is a no-op.
        assert!(!bot.remove_module("temp").await);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_teardown_still_removes_the_module() {
        let bot = bot();
        bot.add_module(
            Module::new("stubborn")
                .command("cmd", noop_command)
                .on_teardown(|_host| async { Err::<(), BoxError>("cleanup failed".into()) }),
        )
        .await
        .unwrap();

        assert!(bot.remove_module("stubborn").await);
        assert_eq!(bot.registry().owned_by("stubborn"), 0);
    }

    #[tokio::test]
    async fn standalone_registrations_survive_module_removal() {
        let bot = bot();
        bot.register_command("solo", noop_command).unwrap();
        bot.register_listener(EventKind::Message, noop_listener);

        bot.add_module(Module::new("mod").command("cmd", noop_command))
            .await
            .unwrap();
        bot.remove_module("mod").await;

        assert!(bot.registry().resolve("solo").is_some());
        assert_eq!(bot.registry().owned_by(STANDALONE_OWNER), 2);
    }

    #[tokio::test]
    async fn readding_a_module_replaces_it() {
        let bot = bot();
        bot.add_module(Module::new("mod").command("cmd", noop_command))
            .await
            .unwrap();
        bot.add_module(Module::new("mod").command("cmd", noop_command))
            .await
            .unwrap();

        bot.remove_module("mod").await;
        assert_eq!(bot.registry().owned_by("mod"), 0);
        assert!(!bot.remove_module("mod").await);
    }

    #[tokio::test]
    async fn shutdown_tears_down_in_reverse_add_order() {
        let bot = bot();
        let order = Arc::new(StdMutex::new(Vec::<&'static str>::new()));

        for (name, tag) in [("first", "first"), ("second", "second")] {
            let trace = Arc::clone(&order);
            bot.add_module(Module::new(name).on_teardown(move |_host| {
                let trace = Arc::clone(&trace);
                async move {
                    trace.lock().unwrap().push(tag);
                    Ok(())
                }
            }))
            .await
            .unwrap();
        }

        bot.shutdown().await;
        assert_eq!(*order.lock().unwrap(), vec!["second", "first"]);
        assert!(matches!(
            bot.handle_webhook(&message_body("hi")).await,
            Err(DispatchError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn removal_during_dispatch_leaves_a_consistent_registry() {
        let bot = Arc::new(bot());

        bot.add_module(Module::new("perm").command("keep", noop_command))
            .await
            .unwrap();

        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let finished = Arc::new(AtomicUsize::new(0));
        {
            let entered = Arc::clone(&entered);
            let release = Arc::clone(&release);
            let finished = Arc::clone(&finished);
            bot.add_module(Module::new("temp").listener(
                EventKind::Message,
                move |_ctx: Arc<Context>| {
                    let entered = Arc::clone(&entered);
                    let release = Arc::clone(&release);
                    let finished = Arc::clone(&finished);
                    async move {
                        entered.notify_one();
                        release.notified().await;
                        finished.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), BoxError>(())
                    }
                },
            ))
            .await
            .unwrap();
        }

        // Start an event whose listener snapshot includes "temp", then remove
        // the module while that handler is still running.
        let in_flight = {
            let bot = Arc::clone(&bot);
            tokio::spawn(async move { bot.handle_webhook(&message_body("hi")).await })
        };
        entered.notified().await;
        assert!(bot.remove_module("temp").await);
        release.notify_one();

        let reports = in_flight.await.unwrap().unwrap();
        // The in-flight invocation completed against its snapshot...
        assert_eq!(reports[0].invoked, 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        // ...and lookups now reflect the post-removal state consistently.
        assert_eq!(bot.registry().owned_by("temp"), 0);
        assert!(bot.registry().resolve("keep").is_some());
        let follow_up = bot.handle_webhook(&message_body("hi")).await.unwrap();
        assert_eq!(follow_up[0].invoked, 0);
    }
}
