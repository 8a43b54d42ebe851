//! Publish and delivery benchmarks.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vellum_bench::fixtures::{generate_change_sets, CountingListener, Scale};
use vellum_core::{ChangeBus, ChangeSet, ListenerRef};

const WORKSPACES: &[&str] = &["default", "drafts", "archive"];

fn bus_with_listeners(count: usize) -> (ChangeBus, Vec<Arc<CountingListener>>) {
    let bus = ChangeBus::new(Some("system".to_string())).expect("bus should start");
    let listeners: Vec<Arc<CountingListener>> =
        (0..count).map(|_| Arc::new(CountingListener::new())).collect();
    for listener in &listeners {
        bus.register(listener.clone() as ListenerRef);
    }
    (bus, listeners)
}

fn bench_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout/notify");
    let change_sets: Vec<Arc<ChangeSet>> = generate_change_sets(Scale::Small.count(), WORKSPACES)
        .into_iter()
        .map(Arc::new)
        .collect();

    for listeners in [0usize, 1, 8, 64] {
        let (bus, _listeners) = bus_with_listeners(listeners);
        group.throughput(Throughput::Elements(change_sets.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| {
                for change_set in &change_sets {
                    bus.notify(black_box(change_set.clone()));
                }
            });
        });
        bus.shutdown();
    }

    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout/deliver");
    group.sample_size(20);
    let change_sets: Vec<Arc<ChangeSet>> = generate_change_sets(Scale::Tiny.count(), WORKSPACES)
        .into_iter()
        .map(Arc::new)
        .collect();

    for listeners in [1usize, 8, 32] {
        let (bus, counters) = bus_with_listeners(listeners);
        let expected = change_sets.len() as u64;
        group.throughput(Throughput::Elements(expected * listeners as u64));
        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| {
                for counter in &counters {
                    counter.reset();
                }
                for change_set in &change_sets {
                    bus.notify(change_set.clone());
                }
                for counter in &counters {
                    assert!(counter.wait_for(expected, Duration::from_secs(10)));
                }
            });
        });
        bus.shutdown();
    }

    group.finish();
}

fn bench_concurrent_publishers(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout/publishers");
    group.sample_size(20);
    let change_sets = generate_change_sets(Scale::Tiny.count(), WORKSPACES);

    for publishers in [1usize, 4, 8] {
        let (bus, counters) = bus_with_listeners(4);
        let expected = (change_sets.len() * publishers) as u64;
        group.bench_with_input(
            BenchmarkId::from_parameter(publishers),
            &publishers,
            |b, &publishers| {
                b.iter(|| {
                    for counter in &counters {
                        counter.reset();
                    }
                    std::thread::scope(|scope| {
                        for _ in 0..publishers {
                            scope.spawn(|| {
                                for change_set in &change_sets {
                                    bus.notify(change_set.clone());
                                }
                            });
                        }
                    });
                    for counter in &counters {
                        assert!(counter.wait_for(expected, Duration::from_secs(10)));
                    }
                });
            },
        );
        bus.shutdown();
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_notify,
    bench_end_to_end,
    bench_concurrent_publishers
);
criterion_main!(benches);
