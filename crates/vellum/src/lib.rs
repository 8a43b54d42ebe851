//! Vellum - content repository facade.
//!
//! A [`Repository`] carries the repository's identity, descriptors and
//! workspaces, and owns the [`ChangeBus`] that committed change-sets are
//! published through. Storage, sessions and queries live elsewhere; this crate
//! only wires the pieces together and manages their lifecycle.
//!
//! # Example
//!
//! ```ignore
//! use vellum::{Repository, RepositoryConfig};
//!
//! let repository = Repository::start(RepositoryConfig::new("content"))?;
//! repository.register_listener(my_listener);
//! repository.publish(vellum::ChangeSet::for_workspace("default"))?;
//! repository.shutdown();
//! ```

pub mod config;
pub mod descriptors;
pub mod error;
pub mod permissions;
pub mod repository;

pub use config::RepositoryConfig;
pub use descriptors::{DescriptorValue, Descriptors};
pub use error::{Error, Result};
pub use permissions::Permission;
pub use repository::{Repository, RepositoryState};

// Re-export the change model and bus so callers need only this crate.
pub use vellum_core::{
    BusConfig, BusStatsSnapshot, Change, ChangeBus, ChangeSet, ChangeSetListener, ListenerError,
    ListenerRef, NodeKey, ShutdownPolicy,
};
