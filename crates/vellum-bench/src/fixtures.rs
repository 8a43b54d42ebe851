//! Change-set and listener fixtures for benchmarks.
//!
//! Generators are seeded so every run publishes the same data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vellum_core::{Change, ChangeSet, ChangeSetListener, ListenerError, NodeKey};

const SEED: u64 = 0x5eed_ce11;

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 100 change-sets, for quick iteration.
    Tiny,
    /// 1,000 change-sets
    #[default]
    Small,
    /// 10,000 change-sets
    Medium,
}

impl Scale {
    /// Number of change-sets to publish at this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 100,
            Scale::Small => 1_000,
            Scale::Medium => 10_000,
        }
    }
}

fn random_name(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn random_change(rng: &mut StdRng) -> Change {
    let key = NodeKey::new(format!("node-{}", rng.gen_range(0..10_000u32)));
    match rng.gen_range(0..4) {
        0 => Change::NodeAdded {
            key,
            parent: NodeKey::new("root"),
            path: format!("/{}", random_name(rng, 8)),
        },
        1 => Change::PropertyAdded {
            key,
            name: random_name(rng, 6),
        },
        2 => Change::PropertyChanged {
            key,
            name: random_name(rng, 6),
        },
        _ => Change::PropertyRemoved {
            key,
            name: random_name(rng, 6),
        },
    }
}

/// Generate change-sets spread over the given workspaces, each with one to
/// five changes.
pub fn generate_change_sets(count: usize, workspaces: &[&str]) -> Vec<ChangeSet> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..count)
        .map(|i| {
            let workspace = workspaces.get(i % workspaces.len().max(1)).copied();
            let changes: Vec<Change> = (0..rng.gen_range(1..=5))
                .map(|_| random_change(&mut rng))
                .collect();
            ChangeSet::new(workspace)
                .with_user_id("bench")
                .with_changes(changes)
        })
        .collect()
}

/// Listener that counts deliveries and lets a caller wait for a total.
#[derive(Default)]
pub struct CountingListener {
    count: AtomicU64,
    lock: Mutex<()>,
    reached: Condvar,
}

impl CountingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }

    /// Wait until at least `target` deliveries were counted. Returns false on timeout.
    pub fn wait_for(&self, target: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while self.count() < target {
            if self.reached.wait_until(&mut guard, deadline).timed_out() {
                return self.count() >= target;
            }
        }
        true
    }
}

impl ChangeSetListener for CountingListener {
    fn notify(&self, _change_set: &ChangeSet) -> Result<(), ListenerError> {
        self.count.fetch_add(1, Ordering::AcqRel);
        let _guard = self.lock.lock();
        self.reached.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_change_sets(20, &["ws1", "ws2"]);
        let b = generate_change_sets(20, &["ws1", "ws2"]);

        let sizes = |sets: &[ChangeSet]| sets.iter().map(ChangeSet::size).collect::<Vec<_>>();
        assert_eq!(sizes(&a), sizes(&b));
        assert!(a.iter().all(|cs| (1..=5).contains(&cs.size())));
        assert_eq!(a[0].workspace_name(), Some("ws1"));
        assert_eq!(a[1].workspace_name(), Some("ws2"));
    }

    #[test]
    fn test_no_workspaces() {
        let sets = generate_change_sets(3, &[]);
        assert!(sets.iter().all(|cs| cs.workspace_name().is_none()));
    }

    #[test]
    fn test_counting_listener() {
        let listener = CountingListener::new();
        let change_set = ChangeSet::without_workspace();
        listener.notify(&change_set).unwrap();
        listener.notify(&change_set).unwrap();

        assert!(listener.wait_for(2, Duration::from_millis(10)));
        assert!(!listener.wait_for(3, Duration::from_millis(10)));
        listener.reset();
        assert_eq!(listener.count(), 0);
    }
}
