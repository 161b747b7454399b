//! Event dispatcher.
//!
//! The [`Dispatcher`] receives one validated webhook body at a time, parses
//! it into events, resolves matching handlers through the [`Registry`], and
//! invokes them with a fresh per-event [`Context`].
//!
//! # Per-event flow
//!
//! 1. Parse the body. A malformed body is rejected
//!    ([`DispatchError::Rejected`]) and no handler runs.
//! 2. For each embedded event, independently:
//!    - a text message is run through the command parser; a parsed
//!      invocation resolves to at most one command handler, and an unbound
//!      name falls back to plain-message handling (or a configurable
//!      "unknown command" reply, see [`UnknownCommandPolicy`]);
//!    - all listeners for the event's kind are resolved in registration
//!      order;
//!    - one task is spawned per matched handler, all sharing the event's
//!      context, and the event completes when every task has settled.
//! 3. A handler failure (error return, panic, or timeout) is caught at
//!    the task boundary, tagged with the handler's identity, logged, and
//!    forwarded to the failure channel if one is attached. Sibling handlers
//!    and later events are unaffected; nothing propagates to the webhook
//!    transport.
//!
//! # Shutdown
//!
//! [`shutdown`](Dispatcher::shutdown) rejects payloads arriving afterwards
//! and waits for every in-flight handler task to finish (graceful drain).
//! Handler tasks are tracked on a [`TaskTracker`], so they drain even if the
//! transport drops its `dispatch` future mid-event.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, debug_span, error, trace, warn};

use weft_core::{BoxedApi, Context, Event, EventKind, ParseError, parse_payload};

use crate::command::parse_command;
use crate::handler::HandlerFuture;
use crate::registry::Registry;

// ============================================================================
// Configuration
// ============================================================================

/// What to do with a prefixed message whose command name is not bound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnknownCommandPolicy {
    /// Treat it as a plain message; listeners still run, nothing is sent.
    #[default]
    Fallthrough,
    /// Reply with the template, `{command}` replaced by the unbound name.
    /// Listeners for the message kind still run.
    Reply {
        /// The notice text, e.g. `"Unknown command: {command}"`.
        template: String,
    },
}

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// The command prefix, e.g. `"!"`.
    pub prefix: String,
    /// Policy for prefixed messages with no bound handler.
    pub unknown_command: UnknownCommandPolicy,
    /// Optional per-handler timeout. The core guarantees isolation, not
    /// liveness; this is the recommended safeguard against a handler that
    /// never finishes.
    pub handler_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_owned(),
            unknown_command: UnknownCommandPolicy::default(),
            handler_timeout: None,
        }
    }
}

// ============================================================================
// Failure reporting
// ============================================================================

/// How one handler invocation failed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("{0}")]
    Failed(weft_core::BoxError),
    /// The handler panicked; the payload's message, when it was a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
    /// The handler exceeded [`DispatchConfig::handler_timeout`].
    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),
}

/// Identity of the registration that produced a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A command handler, by command name.
    Command(String),
    /// A listener, by the kind it was registered for.
    Listener(EventKind),
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Command(name) => write!(f, "command '{name}'"),
            Trigger::Listener(kind) => write!(f, "listener for '{kind}'"),
        }
    }
}

/// One handler failure, tagged with enough identity to act on it.
///
/// Delivered through the channel attached with
/// [`Dispatcher::set_failure_channel`]; always logged regardless.
#[derive(Debug)]
pub struct HandlerFailure {
    /// The module that owns the handler.
    pub module: Arc<str>,
    /// Which registration fired.
    pub trigger: Trigger,
    /// The kind of the event being handled.
    pub event_kind: EventKind,
    /// What went wrong.
    pub error: HandlerError,
}

/// Summary of one dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReport {
    /// The event's kind.
    pub kind: EventKind,
    /// The command that was matched and invoked, if any.
    pub command: Option<String>,
    /// Number of handlers invoked (command handler plus listeners).
    pub invoked: usize,
    /// How many of them failed.
    pub failed: usize,
}

/// A payload that was not dispatched.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The body could not be parsed; no handler ran.
    #[error("payload rejected: {0}")]
    Rejected(#[from] ParseError),
    /// The dispatcher is shutting down; payloads arriving now are refused.
    #[error("dispatcher is shutting down")]
    ShuttingDown,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes parsed events to their handlers.
///
/// Shares the [`Registry`] by reference with whatever registers handlers;
/// holds no registration state of its own. Independent `dispatch` calls do
/// not serialize against each other.
pub struct Dispatcher {
    registry: Arc<Registry>,
    api: BoxedApi,
    config: DispatchConfig,
    failures: Option<mpsc::UnboundedSender<HandlerFailure>>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry and an outbound capability.
    pub fn new(registry: Arc<Registry>, api: BoxedApi, config: DispatchConfig) -> Self {
        Self {
            registry,
            api,
            config,
            failures: None,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Attaches a channel that receives every [`HandlerFailure`].
    pub fn set_failure_channel(&mut self, sender: mpsc::UnboundedSender<HandlerFailure>) {
        self.failures = Some(sender);
    }

    /// Whether shutdown has been signaled.
    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Dispatches one raw, already-authenticated webhook body.
    ///
    /// Returns one [`EventReport`] per embedded event, in delivery order.
    /// Events in the batch are handled concurrently; they share a delivery,
    /// nothing else.
    pub async fn dispatch(&self, raw: &str) -> Result<Vec<EventReport>, DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::ShuttingDown);
        }

        let payload = parse_payload(raw)?;
        debug!(events = payload.events.len(), "webhook payload parsed");

        let reports = futures::future::join_all(
            payload.events.into_iter().map(|event| self.dispatch_event(event)),
        )
        .await;
        reports.into_iter().collect()
    }

    /// Dispatches one already-parsed event.
    pub async fn dispatch_event(&self, event: Event) -> Result<EventReport, DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::ShuttingDown);
        }
        let span = debug_span!("event", kind = %event.kind());
        self.run_event(event).instrument(span).await
    }

    async fn run_event(&self, event: Event) -> Result<EventReport, DispatchError> {
        let kind = event.kind();

        // Resolve the command handler, if the event carries a command.
        let mut matched_command = None;
        let mut unknown_command = None;
        if kind == EventKind::Message
            && let Some(text) = event.text()
            && let Some(invocation) = parse_command(text, &self.config.prefix)
        {
            match self.registry.resolve(&invocation.name) {
                Some(resolved) => matched_command = Some((resolved, invocation)),
                None => unknown_command = Some(invocation.name),
            }
        }

        let listeners = self.registry.resolve_listeners(kind);
        let command = matched_command
            .as_ref()
            .map(|(_, invocation)| invocation.name.clone());
        debug!(
            command = command.as_deref(),
            listeners = listeners.len(),
            "handlers resolved"
        );

        let ctx = Arc::new(Context::new(Arc::new(event), Arc::clone(&self.api)));

        if let Some(name) = unknown_command {
            match &self.config.unknown_command {
                UnknownCommandPolicy::Fallthrough => {
                    trace!(command = %name, "no handler bound, treating as plain message");
                }
                UnknownCommandPolicy::Reply { template } => {
                    let notice = template.replace("{command}", &name);
                    if let Err(err) = ctx.reply_text(notice).await {
                        warn!(command = %name, error = %err, "failed to send unknown-command notice");
                    }
                }
            }
        }

        // One task per matched handler; all share the event's context.
        let mut handles: Vec<(Arc<str>, Trigger, JoinHandle<Result<(), HandlerError>>)> =
            Vec::with_capacity(listeners.len() + 1);
        if let Some((resolved, invocation)) = matched_command {
            let trigger = Trigger::Command(invocation.name.clone());
            let future = resolved.handler.call(Arc::clone(&ctx), invocation);
            handles.push((resolved.owner, trigger, self.spawn_handler(future)));
        }
        for listener in listeners {
            let future = listener.handler.call(Arc::clone(&ctx));
            handles.push((
                listener.owner,
                Trigger::Listener(kind),
                self.spawn_handler(future),
            ));
        }

        let invoked = handles.len();
        let mut failed = 0;
        for (module, trigger, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(join_error) if join_error.is_panic() => {
                    Err(HandlerError::Panicked(panic_message(join_error.into_panic())))
                }
                Err(_) => Err(HandlerError::Failed("handler task was cancelled".into())),
            };

            if let Err(error) = outcome {
                failed += 1;
                error!(
                    module = %module,
                    trigger = %trigger,
                    event_kind = %kind,
                    error = %error,
                    "handler failed"
                );
                if let Some(sender) = &self.failures {
                    let _ = sender.send(HandlerFailure {
                        module,
                        trigger,
                        event_kind: kind,
                        error,
                    });
                }
            }
        }

        debug!(invoked, failed, "event completed");
        Ok(EventReport {
            kind,
            command,
            invoked,
            failed,
        })
    }

    fn spawn_handler(&self, future: HandlerFuture) -> JoinHandle<Result<(), HandlerError>> {
        let timeout = self.config.handler_timeout;
        self.tasks.spawn(async move {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, future).await {
                    Ok(result) => result.map_err(HandlerError::Failed),
                    Err(_) => Err(HandlerError::TimedOut(limit)),
                },
                None => future.await.map_err(HandlerError::Failed),
            }
        })
    }

    /// Signals shutdown and waits for in-flight handlers to finish.
    ///
    /// Payloads arriving after the signal are rejected immediately; events
    /// already being handled run to completion.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        debug!("dispatcher drained");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.config.prefix)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
