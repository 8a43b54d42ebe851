//! Delivery counters for a change bus.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running counters for a single change bus.
///
/// Updated with relaxed atomics from publishers and from the worker thread.
#[derive(Debug, Default)]
pub struct BusStats {
    published: AtomicU64,
    dropped: AtomicU64,
    deliveries: AtomicU64,
    listener_failures: AtomicU64,
    registrations: AtomicU64,
    unregistrations: AtomicU64,
}

/// Point-in-time copy of [`BusStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStatsSnapshot {
    /// Change-sets accepted by `notify`.
    pub published: u64,
    /// Change-sets dropped after shutdown or when the worker was gone.
    pub dropped: u64,
    /// Successful listener invocations.
    pub deliveries: u64,
    /// Listener invocations that returned an error or panicked.
    pub listener_failures: u64,
    /// Successful registrations.
    pub registrations: u64,
    /// Successful unregistrations.
    pub unregistrations: u64,
}

impl BusStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_listener_failure(&self) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unregistration(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a consistent-enough copy of all counters.
    pub fn snapshot(&self) -> BusStatsSnapshot {
        BusStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
        }
    }
}
