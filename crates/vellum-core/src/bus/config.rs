//! Change bus configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default name of the dispatch worker thread.
pub const DEFAULT_WORKER_NAME: &str = "vellum-change-bus";

/// What happens to change-sets still queued when the bus shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Deliver everything accepted before shutdown, then stop.
    #[default]
    Drain,
    /// Abandon queued change-sets; only the delivery in progress completes.
    Discard,
}

impl ShutdownPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownPolicy::Drain => "drain",
            ShutdownPolicy::Discard => "discard",
        }
    }
}

impl fmt::Display for ShutdownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShutdownPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drain" => Ok(ShutdownPolicy::Drain),
            "discard" => Ok(ShutdownPolicy::Discard),
            other => Err(Error::InvalidConfig(format!(
                "unknown shutdown policy '{}'",
                other
            ))),
        }
    }
}

/// Configuration for a change bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Name given to the dispatch worker thread.
    pub worker_name: String,

    /// Handling of queued change-sets at shutdown.
    pub shutdown_policy: ShutdownPolicy,

    /// Name of the administrative workspace. Recorded for listeners; the bus
    /// itself never filters on it.
    pub system_workspace_name: Option<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            shutdown_policy: ShutdownPolicy::Drain,
            system_workspace_name: None,
        }
    }
}

impl BusConfig {
    /// Create a configuration with the given system workspace name.
    pub fn new(system_workspace_name: Option<String>) -> Self {
        Self {
            system_workspace_name,
            ..Default::default()
        }
    }

    /// Set the worker thread name.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Set the shutdown policy.
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    /// Set the system workspace name.
    pub fn with_system_workspace(mut self, name: impl Into<String>) -> Self {
        self.system_workspace_name = Some(name.into());
        self
    }

    /// Check that the configuration can be used to start a bus.
    pub fn validate(&self) -> Result<()> {
        if self.worker_name.trim().is_empty() {
            return Err(Error::InvalidConfig("worker name must not be empty".to_string()));
        }
        // Thread names are passed to the OS as C strings.
        if self.worker_name.contains('\0') {
            return Err(Error::InvalidConfig(
                "worker name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}
