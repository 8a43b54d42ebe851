//! Publisher threads and checking listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use vellum::{
    Change, ChangeSet, ChangeSetListener, ListenerError, ListenerRef, NodeKey, Repository,
};

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::report::{ListenerReport, Report};

const SEQUENCE_KEY: &str = "seq";

/// Counts deliveries and checks that each publisher's change-sets arrive in order.
pub struct OrderingListener {
    name: String,
    received: AtomicU64,
    violations: AtomicU64,
    last_seen: Mutex<HashMap<String, u64>>,
}

impl OrderingListener {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: AtomicU64::new(0),
            violations: AtomicU64::new(0),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn report(&self) -> ListenerReport {
        ListenerReport {
            name: self.name.clone(),
            received: self.received.load(Ordering::Relaxed),
            violations: self.violations.load(Ordering::Relaxed),
            failing: false,
        }
    }
}

impl ChangeSetListener for OrderingListener {
    fn notify(&self, change_set: &ChangeSet) -> std::result::Result<(), ListenerError> {
        self.received.fetch_add(1, Ordering::Relaxed);

        let (Some(publisher), Some(seq)) = (
            change_set.process_key(),
            change_set
                .user_data()
                .get(SEQUENCE_KEY)
                .and_then(|s| s.parse::<u64>().ok()),
        ) else {
            return Ok(());
        };

        let mut last_seen = self.last_seen.lock();
        if let Some(previous) = last_seen.insert(publisher.to_string(), seq) {
            if seq <= previous {
                self.violations.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    listener = %self.name,
                    publisher,
                    previous,
                    seq,
                    "change-set delivered out of order"
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Rejects every change-set it sees.
pub struct RejectingListener {
    name: String,
    calls: AtomicU64,
}

impl RejectingListener {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn report(&self) -> ListenerReport {
        ListenerReport {
            name: self.name.clone(),
            received: self.calls.load(Ordering::Relaxed),
            violations: 0,
            failing: true,
        }
    }
}

impl ChangeSetListener for RejectingListener {
    fn notify(&self, _change_set: &ChangeSet) -> std::result::Result<(), ListenerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(ListenerError::Rejected(format!("{} rejects everything", self.name)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the change-set a publisher commits for one sequence number.
fn change_set(publisher: &str, workspace: &str, seq: usize) -> ChangeSet {
    let key = NodeKey::new(format!("{}/node-{}", publisher, seq));
    ChangeSet::for_workspace(workspace)
        .with_process_key(publisher)
        .with_user_data(SEQUENCE_KEY, seq.to_string())
        .with_change(Change::PropertyChanged {
            key,
            name: "jcr:lastModified".to_string(),
        })
}

/// Run the driver: start a repository, publish from several threads, shut down
/// and collect a report.
pub fn run(config: &DriverConfig) -> Result<Report> {
    let repository = Repository::start(config.repository.clone())?;

    let ordering: Vec<Arc<OrderingListener>> = (0..config.listeners)
        .map(|i| Arc::new(OrderingListener::new(format!("listener-{}", i))))
        .collect();
    let rejecting: Vec<Arc<RejectingListener>> = (0..config.failing_listeners)
        .map(|i| Arc::new(RejectingListener::new(format!("failing-{}", i))))
        .collect();

    for listener in &ordering {
        repository.register_listener(listener.clone() as ListenerRef);
    }
    for listener in &rejecting {
        repository.register_listener(listener.clone() as ListenerRef);
    }

    let workspaces = config.target_workspaces();
    let started = Instant::now();

    thread::scope(|scope| -> Result<()> {
        let handles: Vec<_> = (0..config.publishers)
            .map(|p| {
                let repository = &repository;
                let workspaces = &workspaces;
                scope.spawn(move || -> Result<()> {
                    let publisher = format!("publisher-{}", p);
                    for seq in 0..config.events_per_publisher {
                        let workspace = &workspaces[seq % workspaces.len()];
                        repository.publish(change_set(&publisher, workspace, seq))?;
                    }
                    tracing::debug!(publisher = %publisher, "publisher finished");
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.join().map_err(|_| Error::PublisherPanicked)??;
        }
        Ok(())
    })?;

    repository.shutdown();
    let elapsed = started.elapsed();

    let listeners = ordering
        .iter()
        .map(|l| l.report())
        .chain(rejecting.iter().map(|l| l.report()))
        .collect();

    Ok(Report {
        repository: repository.name().to_string(),
        policy: config.repository.bus.shutdown_policy.to_string(),
        publishers: config.publishers,
        events_per_publisher: config.events_per_publisher,
        elapsed_ms: elapsed.as_millis() as u64,
        listeners,
        stats: repository.bus_stats(),
    })
}
