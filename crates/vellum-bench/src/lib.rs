//! Vellum Benchmark Suite
//!
//! Criterion benchmarks for the change bus.
//!
//! # Benchmark Categories
//!
//! - **Fanout**: publish throughput and end-to-end delivery with many listeners
//! - **Registry**: register/unregister and snapshot cost as listeners grow

pub mod fixtures;

pub use fixtures::{generate_change_sets, CountingListener, Scale};
