//! In-process change bus.
//!
//! The bus fans committed change-sets out to every registered listener on a
//! single bus-owned worker thread.
//!
//! - The set of listeners that receive a change-set is the registry snapshot
//!   taken inside [`ChangeBus::notify`], before it returns.
//! - Change-sets from one publisher reach each listener in publish order.
//! - A listener that fails or panics is logged and skipped; publishers never
//!   see listener errors.
//! - After [`ChangeBus::shutdown`] publishes are silently dropped.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use vellum_core::{ChangeBus, ChangeSet, ListenerRef};
//!
//! let bus = ChangeBus::new(Some("system".to_string()))?;
//! let listener: ListenerRef = Arc::new(MyListener::default());
//! assert!(bus.register(listener.clone()));
//!
//! bus.notify(ChangeSet::for_workspace("default"));
//! bus.shutdown();
//! ```

mod config;
mod dispatcher;
mod registry;
mod stats;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;

pub use config::{BusConfig, ShutdownPolicy, DEFAULT_WORKER_NAME};
pub use registry::{ListenerRegistry, ListenerSnapshot};
pub use stats::{BusStats, BusStatsSnapshot};

use dispatcher::{DispatchWorker, Envelope, EnvelopeSender, WorkerShared};

use crate::change::ChangeSet;
use crate::error::Result;
use crate::listener::{ChangeSetListener, ListenerError, ListenerRef};

/// Lifecycle state of a change bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BusState {
    /// Accepting registrations and publishes.
    Running = 0,
    /// Shutdown requested; the worker is finishing.
    Draining = 1,
    /// The worker has returned from its last delivery. Nothing more will be
    /// delivered.
    Terminated = 2,
}

impl BusState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => BusState::Running,
            1 => BusState::Draining,
            _ => BusState::Terminated,
        }
    }
}

/// Pub-sub fan-out of change-sets to registered listeners.
pub struct ChangeBus {
    config: BusConfig,
    registry: ListenerRegistry,
    /// Publisher side of the dispatch queue. `None` once shut down.
    sender: RwLock<Option<EnvelopeSender>>,
    shared: Arc<WorkerShared>,
    worker: DispatchWorker,
}

impl ChangeBus {
    /// Create a running bus with default settings.
    pub fn new(system_workspace_name: Option<String>) -> Result<Self> {
        Self::with_config(BusConfig::new(system_workspace_name))
    }

    /// Create a running bus from a configuration.
    ///
    /// This spawns the dispatch worker thread.
    pub fn with_config(config: BusConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(WorkerShared::new());
        let (worker, sender) = DispatchWorker::start(&config.worker_name, shared.clone())?;

        tracing::debug!(
            worker = %config.worker_name,
            policy = %config.shutdown_policy,
            system_workspace = ?config.system_workspace_name,
            "change bus created"
        );

        Ok(Self {
            config,
            registry: ListenerRegistry::new(),
            sender: RwLock::new(Some(sender)),
            shared,
            worker,
        })
    }

    /// Register a listener.
    ///
    /// Returns false if the listener is absent, already registered, or the
    /// bus has been shut down.
    pub fn register(&self, listener: impl Into<Option<ListenerRef>>) -> bool {
        let Some(listener) = listener.into() else {
            return false;
        };
        if !self.is_running() {
            return false;
        }

        let name = listener.name().to_string();
        let added = self.registry.register(listener);
        if added {
            self.shared.stats.record_registration();
            tracing::debug!(listener = %name, count = self.registry.len(), "listener registered");
        }
        added
    }

    /// Unregister a listener.
    ///
    /// Returns true iff the listener was registered.
    pub fn unregister(&self, listener: impl Into<Option<ListenerRef>>) -> bool {
        let Some(listener) = listener.into() else {
            return false;
        };

        let name = listener.name().to_string();
        let removed = self.registry.unregister(listener);
        if removed {
            self.shared.stats.record_unregistration();
            tracing::debug!(listener = %name, count = self.registry.len(), "listener unregistered");
        }
        removed
    }

    /// Publish a change-set to every currently registered listener.
    ///
    /// Returns as soon as the change-set is queued. After shutdown the
    /// change-set is dropped without error.
    pub fn notify(&self, change_set: impl Into<Arc<ChangeSet>>) {
        let change_set = change_set.into();

        let sender = self.sender.read();
        let Some(tx) = sender.as_ref() else {
            self.shared.stats.record_dropped();
            tracing::debug!(
                workspace = change_set.workspace_name().unwrap_or("<none>"),
                "change bus is shut down; dropping change-set"
            );
            return;
        };

        let listeners = self.registry.snapshot();
        self.shared.stats.record_published();
        if listeners.is_empty() {
            return;
        }

        if tx.send(Envelope { change_set, listeners }).is_err() {
            self.shared.stats.record_dropped();
            tracing::warn!("change bus worker is unavailable; dropping change-set");
        }
    }

    /// Stop the bus.
    ///
    /// Publishes and registrations are refused from this point on. Queued
    /// change-sets are delivered or abandoned according to the configured
    /// [`ShutdownPolicy`], and the worker thread is joined. Calling this again
    /// has no effect.
    ///
    /// Called from inside a listener, this returns at once with the bus still
    /// `Draining`; the worker finishes the change-set in hand, abandons the
    /// rest and then reports `Terminated`.
    pub fn shutdown(&self) {
        if self
            .shared
            .state
            .compare_exchange(
                BusState::Running as u8,
                BusState::Draining as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }

        tracing::info!(
            worker = %self.config.worker_name,
            policy = %self.config.shutdown_policy,
            "shutting down change bus"
        );

        self.registry.close();

        // A listener stopping its own bus cannot wait for the queue to drain.
        let on_worker = self.worker.is_current_thread();
        if self.config.shutdown_policy == ShutdownPolicy::Discard || on_worker {
            self.shared.discard.store(true, Ordering::SeqCst);
        }

        // Dropping the last sender closes the queue; the worker exits once empty.
        drop(self.sender.write().take());
        if on_worker {
            return;
        }
        self.worker.join();

        // The worker marks itself terminated on a clean exit; this covers one that died.
        self.shared
            .state
            .store(BusState::Terminated as u8, Ordering::SeqCst);
        tracing::info!(worker = %self.config.worker_name, "change bus terminated");
    }

    /// Get the lifecycle state.
    pub fn state(&self) -> BusState {
        self.shared.state()
    }

    /// Check if the bus accepts publishes.
    pub fn is_running(&self) -> bool {
        self.state() == BusState::Running
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.state() != BusState::Running
    }

    /// Get the administrative workspace name this bus was created with.
    pub fn system_workspace_name(&self) -> Option<&str> {
        self.config.system_workspace_name.as_deref()
    }

    /// Get the bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Get the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Check whether a listener is registered.
    pub fn has_listener(&self, listener: &ListenerRef) -> bool {
        self.registry.contains(listener)
    }

    /// Get a copy of the delivery counters.
    pub fn stats(&self) -> BusStatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl ChangeSetListener for ChangeBus {
    /// Forward a change-set received from another bus.
    fn notify(&self, change_set: &ChangeSet) -> std::result::Result<(), ListenerError> {
        ChangeBus::notify(self, change_set.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.worker_name
    }
}

impl Drop for ChangeBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}
