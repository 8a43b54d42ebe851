//! Dispatch worker.
//!
//! Publishers push [`Envelope`]s onto an unbounded FIFO queue; a single
//! bus-owned thread pops them and calls each listener in the envelope's
//! snapshot. One consumer on one FIFO keeps every publisher's change-sets in
//! publish order.
//!
//! ```text
//! notify():  snapshot registry → queue.send(envelope) → return
//! worker:    queue.recv() → listener.notify() for each snapshot listener
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::registry::ListenerSnapshot;
use super::stats::BusStats;
use super::BusState;
use crate::change::ChangeSet;
use crate::error::{Error, Result};
use crate::listener::ListenerRef;

/// A change-set paired with the listeners that must receive it.
pub(crate) struct Envelope {
    pub change_set: Arc<ChangeSet>,
    pub listeners: ListenerSnapshot,
}

/// Sending half of the dispatch queue.
pub(crate) type EnvelopeSender = mpsc::UnboundedSender<Envelope>;

/// State shared between the bus and its worker thread.
pub(crate) struct WorkerShared {
    pub stats: BusStats,
    /// When set, the worker drops queued envelopes instead of delivering them.
    pub discard: AtomicBool,
    /// Lifecycle state. Only the worker moves it to `Terminated`, once its
    /// last delivery has returned.
    pub state: AtomicU8,
}

impl WorkerShared {
    pub fn new() -> Self {
        Self {
            stats: BusStats::new(),
            discard: AtomicBool::new(false),
            state: AtomicU8::new(BusState::Running as u8),
        }
    }

    pub fn state(&self) -> BusState {
        BusState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Handle to the running dispatch worker thread.
pub(crate) struct DispatchWorker {
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl DispatchWorker {
    /// Spawn the worker thread and return it with the queue feeding it.
    pub fn start(name: &str, shared: Arc<WorkerShared>) -> Result<(Self, EnvelopeSender)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::worker_loop(rx, shared))
            .map_err(Error::WorkerSpawn)?;

        let thread_id = handle.thread().id();
        Ok((
            Self {
                handle: Mutex::new(Some(handle)),
                thread_id,
            },
            tx,
        ))
    }

    /// Check whether the caller is running on the worker thread.
    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Wait for the worker to exit.
    ///
    /// The queue must already be closed. Calling this from the worker thread
    /// itself detaches the worker instead of deadlocking.
    pub fn join(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };

        if self.is_current_thread() {
            tracing::debug!("change bus stopped from its own worker; not joining");
            return;
        }

        if handle.join().is_err() {
            tracing::warn!("change bus worker terminated abnormally");
        }
    }

    /// Check if the worker thread is still alive.
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// The main worker loop. Runs until every sender is gone and the queue is empty.
    fn worker_loop(mut rx: mpsc::UnboundedReceiver<Envelope>, shared: Arc<WorkerShared>) {
        tracing::info!("change bus worker started");

        while let Some(envelope) = rx.blocking_recv() {
            if shared.discard.load(Ordering::SeqCst) {
                shared.stats.record_dropped();
                continue;
            }
            dispatch(&envelope, &shared.stats);
        }

        shared
            .state
            .store(BusState::Terminated as u8, Ordering::SeqCst);
        tracing::info!("change bus worker stopped (queue closed)");
    }
}

/// Deliver one envelope to every listener in its snapshot, in order.
fn dispatch(envelope: &Envelope, stats: &BusStats) {
    let change_set = envelope.change_set.as_ref();

    tracing::trace!(
        workspace = change_set.workspace_name().unwrap_or("<none>"),
        timestamp = change_set.timestamp_millis(),
        listeners = envelope.listeners.len(),
        "dispatching change-set"
    );

    for listener in envelope.listeners.iter() {
        deliver(listener, change_set, stats);
    }
}

/// Call a single listener, containing any error or panic it raises.
fn deliver(listener: &ListenerRef, change_set: &ChangeSet, stats: &BusStats) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.notify(change_set)));

    match outcome {
        Ok(Ok(())) => stats.record_delivery(),
        Ok(Err(e)) => {
            stats.record_listener_failure();
            tracing::warn!(
                listener = listener.name(),
                address = ?Arc::as_ptr(listener),
                workspace = change_set.workspace_name().unwrap_or("<none>"),
                error = %e,
                "listener failed to handle change-set"
            );
        }
        Err(payload) => {
            stats.record_listener_failure();
            tracing::warn!(
                listener = listener.name(),
                address = ?Arc::as_ptr(listener),
                workspace = change_set.workspace_name().unwrap_or("<none>"),
                panic = panic_message(payload.as_ref()),
                "listener panicked while handling change-set"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ChangeSetListener, ListenerError};
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    struct Counter(AtomicUsize);

    impl ChangeSetListener for Counter {
        fn notify(&self, _change_set: &ChangeSet) -> std::result::Result<(), ListenerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Exploding;

    impl ChangeSetListener for Exploding {
        fn notify(&self, _change_set: &ChangeSet) -> std::result::Result<(), ListenerError> {
            panic!("boom");
        }
    }

    fn envelope(listeners: Vec<ListenerRef>) -> Envelope {
        Envelope {
            change_set: Arc::new(ChangeSet::for_workspace("ws1")),
            listeners: listeners.into(),
        }
    }

    #[test]
    fn test_dispatch_contains_panics() {
        let stats = BusStats::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let listeners: Vec<ListenerRef> = vec![Arc::new(Exploding), counter.clone()];

        dispatch(&envelope(listeners), &stats);

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.deliveries, 1);
        assert_eq!(snapshot.listener_failures, 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }

    #[test]
    fn test_worker_exits_when_queue_closes() {
        let shared = Arc::new(WorkerShared::new());
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let (worker, tx) = DispatchWorker::start("dispatch-test", shared.clone()).unwrap();

        assert!(!worker.is_current_thread());
        tx.send(envelope(vec![counter.clone()])).ok().unwrap();
        tx.send(envelope(vec![counter.clone()])).ok().unwrap();
        drop(tx);

        worker.join();
        assert!(!worker.is_running());
        assert_eq!(shared.state(), BusState::Terminated);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert_eq!(shared.stats.snapshot().deliveries, 2);
    }

    #[test]
    fn test_worker_discards_when_flagged() {
        let shared = Arc::new(WorkerShared::new());
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        shared.discard.store(true, Ordering::SeqCst);
        let (worker, tx) = DispatchWorker::start("dispatch-discard", shared.clone()).unwrap();

        tx.send(envelope(vec![counter.clone()])).ok().unwrap();
        drop(tx);

        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        worker.join();

        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
        assert_eq!(shared.stats.snapshot().dropped, 1);
    }
}
