//! Handler registry.
//!
//! Maps command names and event-kind listeners to handlers, tagged with the
//! module that owns each binding. All state sits behind one
//! [`parking_lot::Mutex`]: registrations, removals, and lookups each hold the
//! lock for the duration of the call and nothing else; the lock is never
//! held across a handler invocation. Lookups clone `Arc`s out so dispatch
//! proceeds on a consistent snapshot even if a module is removed mid-event.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use weft_core::EventKind;

use crate::error::RegistryError;
use crate::handler::{BoxedCommandHandler, BoxedEventHandler};

#[derive(Clone)]
struct CommandEntry {
    owner: Arc<str>,
    handler: BoxedCommandHandler,
}

#[derive(Clone)]
struct ListenerEntry {
    owner: Arc<str>,
    handler: BoxedEventHandler,
}

#[derive(Default)]
struct RegistryInner {
    commands: HashMap<String, CommandEntry>,
    listeners: HashMap<EventKind, Vec<ListenerEntry>>,
}

/// A command binding resolved for dispatch.
pub struct ResolvedCommand {
    /// The module that registered the handler.
    pub owner: Arc<str>,
    /// The handler itself.
    pub handler: BoxedCommandHandler,
}

/// A listener binding resolved for dispatch.
pub struct ResolvedListener {
    /// The module that registered the handler.
    pub owner: Arc<str>,
    /// The handler itself.
    pub handler: BoxedEventHandler,
}

/// The table of command and listener bindings.
///
/// Explicitly constructed and shared by reference between the bot and the
/// dispatcher; there is no global instance.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a command name to a handler owned by `owner`.
    ///
    /// A name already bound by a *different* module is a
    /// [`RegistryError::DuplicateCommand`]. Re-binding by the same owner
    /// replaces the handler, so a module can be re-added.
    pub fn register_command(
        &self,
        name: impl Into<String>,
        owner: &str,
        handler: BoxedCommandHandler,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.commands.get(&name)
            && existing.owner.as_ref() != owner
        {
            return Err(RegistryError::DuplicateCommand {
                name,
                owner: existing.owner.to_string(),
            });
        }
        inner.commands.insert(
            name,
            CommandEntry {
                owner: Arc::from(owner),
                handler,
            },
        );
        Ok(())
    }

    /// Appends a listener for `kind` owned by `owner`. Never fails; listeners
    /// for one kind fan out in registration order.
    pub fn register_listener(&self, kind: EventKind, owner: &str, handler: BoxedEventHandler) {
        let mut inner = self.inner.lock();
        inner.listeners.entry(kind).or_default().push(ListenerEntry {
            owner: Arc::from(owner),
            handler,
        });
    }

    /// Registers a whole module's bindings in one critical section.
    ///
    /// All-or-nothing: every command name is checked against other modules'
    /// bindings before anything is inserted, so a conflict leaves the
    /// registry exactly as it was.
    pub fn register_module(
        &self,
        owner: &str,
        commands: Vec<(String, BoxedCommandHandler)>,
        listeners: Vec<(EventKind, BoxedEventHandler)>,
    ) -> Result<(), RegistryError> {
        let owner: Arc<str> = Arc::from(owner);
        let mut inner = self.inner.lock();

        for (name, _) in &commands {
            if let Some(existing) = inner.commands.get(name)
                && existing.owner != owner
            {
                return Err(RegistryError::DuplicateCommand {
                    name: name.clone(),
                    owner: existing.owner.to_string(),
                });
            }
        }

        for (name, handler) in commands {
            inner.commands.insert(
                name,
                CommandEntry {
                    owner: Arc::clone(&owner),
                    handler,
                },
            );
        }
        for (kind, handler) in listeners {
            inner.listeners.entry(kind).or_default().push(ListenerEntry {
                owner: Arc::clone(&owner),
                handler,
            });
        }
        Ok(())
    }

    /// Removes every binding owned by `module`. Idempotent; returns the
    /// number of bindings removed.
    pub fn unregister_module(&self, module: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.commands.len()
            + inner.listeners.values().map(Vec::len).sum::<usize>();

        inner.commands.retain(|_, entry| entry.owner.as_ref() != module);
        for entries in inner.listeners.values_mut() {
            entries.retain(|entry| entry.owner.as_ref() != module);
        }
        inner.listeners.retain(|_, entries| !entries.is_empty());

        before
            - (inner.commands.len() + inner.listeners.values().map(Vec::len).sum::<usize>())
    }

    /// Looks up the handler bound to a command name. Pure; does not mutate.
    pub fn resolve(&self, name: &str) -> Option<ResolvedCommand> {
        let inner = self.inner.lock();
        inner.commands.get(name).map(|entry| ResolvedCommand {
            owner: Arc::clone(&entry.owner),
            handler: Arc::clone(&entry.handler),
        })
    }

    /// Looks up all listeners for an event kind, in registration order.
    /// Pure; does not mutate.
    pub fn resolve_listeners(&self, kind: EventKind) -> Vec<ResolvedListener> {
        let inner = self.inner.lock();
        inner
            .listeners
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| ResolvedListener {
                        owner: Arc::clone(&entry.owner),
                        handler: Arc::clone(&entry.handler),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of bindings owned by `module`.
    pub fn owned_by(&self, module: &str) -> usize {
        let inner = self.inner.lock();
        inner
            .commands
            .values()
            .filter(|entry| entry.owner.as_ref() == module)
            .count()
            + inner
                .listeners
                .values()
                .flatten()
                .filter(|entry| entry.owner.as_ref() == module)
                .count()
    }

    /// Number of registered command bindings.
    pub fn command_count(&self) -> usize {
        self.inner.lock().commands.len()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Registry")
            .field("commands", &inner.commands.len())
            .field(
                "listeners",
                &inner.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weft_core::{BoxError, Context};

    use crate::command::CommandInvocation;

    fn noop_command() -> BoxedCommandHandler {
        Arc::new(|_ctx: Arc<Context>, _inv: CommandInvocation| async {
            Ok::<(), BoxError>(())
        })
    }

    fn noop_listener() -> BoxedEventHandler {
        Arc::new(|_ctx: Arc<Context>| async { Ok::<(), BoxError>(()) })
    }

    #[test]
    fn duplicate_command_across_modules_is_rejected() {
        let registry = Registry::new();
        registry
            .register_command("hello", "greetings", noop_command())
            .unwrap();

        match registry.register_command("hello", "other", noop_command()) {
            Err(RegistryError::DuplicateCommand { name, owner }) => {
                assert_eq!(name, "hello");
                assert_eq!(owner, "greetings");
            }
            Ok(()) => panic!("expected duplicate command error"),
        }
        // The original binding is intact.
        assert!(registry.resolve("hello").is_some());
        assert_eq!(registry.command_count(), 1);
    }

    #[test]
    fn same_module_rebinds_instead_of_erroring() {
        let registry = Registry::new();
        registry
            .register_command("hello", "greetings", noop_command())
            .unwrap();
        registry
            .register_command("hello", "greetings", noop_command())
            .unwrap();
        assert_eq!(registry.command_count(), 1);
    }

    #[test]
    fn module_registration_is_all_or_nothing() {
        let registry = Registry::new();
        registry
            .register_command("taken", "first", noop_command())
            .unwrap();

        let result = registry.register_module(
            "second",
            vec![
                ("fresh".to_owned(), noop_command()),
                ("taken".to_owned(), noop_command()),
            ],
            vec![(weft_core::EventKind::Message, noop_listener())],
        );

        assert!(result.is_err());
        // Nothing from the failed call leaked in.
        assert!(registry.resolve("fresh").is_none());
        assert_eq!(registry.owned_by("second"), 0);
        assert_eq!(registry.resolve("taken").unwrap().owner.as_ref(), "first");
    }

    #[test]
    fn unregister_module_removes_everything_it_owns() {
        let registry = Registry::new();
        registry
            .register_module(
                "mod",
                vec![("a".to_owned(), noop_command())],
                vec![
                    (weft_core::EventKind::Message, noop_listener()),
                    (weft_core::EventKind::Follow, noop_listener()),
                ],
            )
            .unwrap();
        registry.register_listener(weft_core::EventKind::Message, "other", noop_listener());

        assert_eq!(registry.owned_by("mod"), 3);
        assert_eq!(registry.unregister_module("mod"), 3);
        assert_eq!(registry.owned_by("mod"), 0);
        // Other modules' listeners survive.
        assert_eq!(
            registry
                .resolve_listeners(weft_core::EventKind::Message)
                .len(),
            1
        );
        // Idempotent.
        assert_eq!(registry.unregister_module("mod"), 0);
    }

    #[test]
    fn double_registration_then_one_removal_leaves_nothing() {
        let registry = Registry::new();
        for _ in 0..2 {
            registry
                .register_module(
                    "mod",
                    vec![("a".to_owned(), noop_command())],
                    vec![(weft_core::EventKind::Message, noop_listener())],
                )
                .unwrap();
        }
        // The command re-bound, the listener appended twice.
        assert_eq!(registry.owned_by("mod"), 3);

        registry.unregister_module("mod");
        assert_eq!(registry.owned_by("mod"), 0);
    }

    #[test]
    fn listeners_resolve_in_registration_order() {
        let registry = Registry::new();
        registry.register_listener(weft_core::EventKind::Message, "first", noop_listener());
        registry.register_listener(weft_core::EventKind::Message, "second", noop_listener());
        registry.register_listener(weft_core::EventKind::Message, "third", noop_listener());

        let owners: Vec<String> = registry
            .resolve_listeners(weft_core::EventKind::Message)
            .iter()
            .map(|entry| entry.owner.to_string())
            .collect();
        assert_eq!(owners, vec!["first", "second", "third"]);
    }

    #[test]
    fn resolve_misses_return_none_or_empty() {
        let registry = Registry::new();
        assert!(registry.resolve("absent").is_none());
        assert!(registry
            .resolve_listeners(weft_core::EventKind::Postback)
            .is_empty());
    }
}
