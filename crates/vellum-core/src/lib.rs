//! Vellum Core - Change-set model and change bus.
//!
//! This crate provides the value types describing a committed set of content
//! changes and the in-process bus that fans those change-sets out to
//! registered listeners.
//!
//! # Modules
//!
//! - [`change`] - `ChangeSet`, `Change` and `NodeKey` value types
//! - [`listener`] - The `ChangeSetListener` contract
//! - [`bus`] - Listener registry, dispatcher and lifecycle
//! - [`error`] - Core error types

pub mod bus;
pub mod change;
pub mod error;
pub mod listener;

pub use bus::{
    BusConfig, BusState, BusStats, BusStatsSnapshot, ChangeBus, ListenerRegistry, ShutdownPolicy,
    DEFAULT_WORKER_NAME,
};
pub use change::{Change, ChangeSet, NodeKey};
pub use error::{Error, Result};
pub use listener::{ChangeSetListener, ListenerError, ListenerRef};
