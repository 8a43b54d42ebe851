//! Copy-on-write listener registry.
//!
//! The registry keeps listeners in an immutable slice behind an `Arc`. Every
//! mutation builds a new slice and swaps it in under a write lock, so a
//! snapshot is a single `Arc` clone and stays valid however the registry
//! changes afterwards.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::listener::{same_listener, ListenerRef};

/// Immutable view of the listeners registered at one instant.
pub type ListenerSnapshot = Arc<[ListenerRef]>;

struct RegistryState {
    listeners: ListenerSnapshot,
    closed: bool,
}

/// Ordered set of listeners with identity-based membership.
pub struct ListenerRegistry {
    state: RwLock<RegistryState>,
}

impl ListenerRegistry {
    /// Create an empty, open registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                listeners: Arc::from(Vec::new()),
                closed: false,
            }),
        }
    }

    /// Add a listener at the end of the registration order.
    ///
    /// Returns false if the listener is absent, already registered, or the
    /// registry has been closed.
    pub fn register(&self, listener: impl Into<Option<ListenerRef>>) -> bool {
        let Some(listener) = listener.into() else {
            return false;
        };

        let mut state = self.state.write();
        if state.closed || state.listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }

        let mut listeners = Vec::with_capacity(state.listeners.len() + 1);
        listeners.extend(state.listeners.iter().cloned());
        listeners.push(listener);
        state.listeners = listeners.into();
        true
    }

    /// Remove a listener.
    ///
    /// Returns true iff the listener was registered.
    pub fn unregister(&self, listener: impl Into<Option<ListenerRef>>) -> bool {
        let Some(listener) = listener.into() else {
            return false;
        };

        let mut state = self.state.write();
        if !state.listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }

        let listeners: Vec<ListenerRef> = state
            .listeners
            .iter()
            .filter(|l| !same_listener(l, &listener))
            .cloned()
            .collect();
        state.listeners = listeners.into();
        true
    }

    /// Get the listeners registered right now, in registration order.
    pub fn snapshot(&self) -> ListenerSnapshot {
        self.state.read().listeners.clone()
    }

    /// Check whether a listener is registered.
    pub fn contains(&self, listener: &ListenerRef) -> bool {
        self.state
            .read()
            .listeners
            .iter()
            .any(|l| same_listener(l, listener))
    }

    /// Get the number of registered listeners.
    pub fn len(&self) -> usize {
        self.state.read().listeners.len()
    }

    /// Check if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().listeners.is_empty()
    }

    /// Refuse further registrations.
    ///
    /// Existing members stay registered so removals still report whether a
    /// listener was known. Returns the registered listeners.
    pub fn close(&self) -> ListenerSnapshot {
        let mut state = self.state.write();
        state.closed = true;
        state.listeners.clone()
    }

    /// Check whether the registry has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
