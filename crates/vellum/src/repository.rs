//! Repository lifecycle and workspace management.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use vellum_core::{BusStatsSnapshot, Change, ChangeBus, ChangeSet, ListenerRef};

use crate::config::RepositoryConfig;
use crate::descriptors::{DescriptorValue, Descriptors};
use crate::error::{Error, Result};

/// Lifecycle state of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    Running,
    Terminated,
}

/// A running content repository.
///
/// Owns the change bus; every change-set committed through the repository is
/// published on it.
pub struct Repository {
    config: RepositoryConfig,
    /// Unique key of this repository instance, stamped on published change-sets.
    key: String,
    bus: Arc<ChangeBus>,
    descriptors: Descriptors,
    workspaces: RwLock<BTreeSet<String>>,
    terminated: AtomicBool,
}

impl Repository {
    /// Start a repository from a configuration.
    pub fn start(config: RepositoryConfig) -> Result<Self> {
        config.validate()?;

        let bus = Arc::new(ChangeBus::with_config(config.bus_config())?);
        let workspaces: BTreeSet<String> = config.initial_workspaces().into_iter().collect();
        let descriptors = Descriptors::for_repository(&config.name);
        let key = Uuid::new_v4().to_string();

        info!(
            name = %config.name,
            key = %key,
            workspaces = workspaces.len(),
            "repository started"
        );

        Ok(Self {
            config,
            key,
            bus,
            descriptors,
            workspaces: RwLock::new(workspaces),
            terminated: AtomicBool::new(false),
        })
    }

    /// Get the repository name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the unique key of this repository instance.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> RepositoryState {
        if self.terminated.load(Ordering::SeqCst) {
            RepositoryState::Terminated
        } else {
            RepositoryState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == RepositoryState::Running
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Get the change bus.
    pub fn change_bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    /// Register a listener on the change bus.
    pub fn register_listener(&self, listener: impl Into<Option<ListenerRef>>) -> bool {
        self.bus.register(listener)
    }

    /// Unregister a listener from the change bus.
    pub fn unregister_listener(&self, listener: impl Into<Option<ListenerRef>>) -> bool {
        self.bus.unregister(listener)
    }

    /// Publish a committed change-set.
    ///
    /// The change-set is stamped with this repository's key unless it already
    /// carries one. A change-set naming an unknown workspace is rejected;
    /// one with no workspace is published as-is.
    pub fn publish(&self, change_set: ChangeSet) -> Result<()> {
        self.ensure_running()?;

        if let Some(workspace) = change_set.workspace_name() {
            if !self.has_workspace(workspace) {
                return Err(Error::NoSuchWorkspace(workspace.to_string()));
            }
        }

        let change_set = if change_set.repository_key().is_none() {
            change_set.with_repository_key(self.key.clone())
        } else {
            change_set
        };
        self.bus.notify(change_set);
        Ok(())
    }

    /// Get the workspace names, sorted.
    pub fn workspace_names(&self) -> Vec<String> {
        self.workspaces.read().iter().cloned().collect()
    }

    pub fn has_workspace(&self, name: &str) -> bool {
        self.workspaces.read().contains(name)
    }

    pub fn default_workspace_name(&self) -> &str {
        &self.config.default_workspace_name
    }

    pub fn system_workspace_name(&self) -> &str {
        &self.config.system_workspace_name
    }

    /// Create a workspace.
    ///
    /// Returns false if the workspace already exists. Otherwise a
    /// [`Change::WorkspaceAdded`] change-set is published on the system
    /// workspace.
    pub fn create_workspace(&self, name: &str) -> Result<bool> {
        self.ensure_running()?;
        if name.trim().is_empty() {
            return Err(Error::InvalidConfig(format!("invalid workspace name '{}'", name)));
        }

        if !self.workspaces.write().insert(name.to_string()) {
            return Ok(false);
        }

        debug!(workspace = name, "workspace created");
        self.publish_system_change(Change::WorkspaceAdded {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Destroy a workspace.
    ///
    /// Returns false if the workspace does not exist. The system and default
    /// workspaces cannot be destroyed.
    pub fn destroy_workspace(&self, name: &str) -> Result<bool> {
        self.ensure_running()?;
        if name == self.config.system_workspace_name || name == self.config.default_workspace_name
        {
            return Err(Error::InvalidConfig(format!(
                "workspace '{}' cannot be destroyed",
                name
            )));
        }

        if !self.workspaces.write().remove(name) {
            return Ok(false);
        }

        debug!(workspace = name, "workspace destroyed");
        self.publish_system_change(Change::WorkspaceRemoved {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Get a descriptor value.
    pub fn descriptor(&self, key: &str) -> Option<&DescriptorValue> {
        self.descriptors.get(key)
    }

    /// Get all descriptor keys, sorted.
    pub fn descriptor_keys(&self) -> Vec<&str> {
        self.descriptors.keys()
    }

    pub fn is_standard_descriptor(&self, key: &str) -> bool {
        Descriptors::is_standard_descriptor(key)
    }

    pub fn is_single_value_descriptor(&self, key: &str) -> bool {
        self.descriptors.is_single_value_descriptor(key)
    }

    /// Get the change bus counters.
    pub fn bus_stats(&self) -> BusStatsSnapshot {
        self.bus.stats()
    }

    /// Shut the repository down.
    ///
    /// Stops the change bus according to its shutdown policy. Calling this
    /// again has no effect.
    pub fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(name = %self.config.name, "shutting down repository");
        self.bus.shutdown();
        info!(name = %self.config.name, "repository shut down");
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }

    fn publish_system_change(&self, change: Change) {
        let change_set = ChangeSet::for_workspace(self.config.system_workspace_name.clone())
            .with_change(change)
            .with_repository_key(self.key.clone());
        self.bus.notify(change_set);
    }
}

impl Drop for Repository {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{QUERY_LANGUAGES, REP_NAME_DESC};

    fn repository() -> Repository {
        Repository::start(RepositoryConfig::new("unit").with_workspace("drafts")).unwrap()
    }

    #[test]
    fn test_start_and_shutdown() {
        let repository = repository();
        assert_eq!(repository.name(), "unit");
        assert_eq!(repository.state(), RepositoryState::Running);
        assert!(Uuid::parse_str(repository.key()).is_ok());
        assert_eq!(repository.change_bus().system_workspace_name(), Some("system"));

        repository.shutdown();
        assert_eq!(repository.state(), RepositoryState::Terminated);
        assert!(repository.change_bus().is_shutdown());

        repository.shutdown();
        assert_eq!(repository.state(), RepositoryState::Terminated);
    }

    #[test]
    fn test_invalid_config_fails_to_start() {
        let config = RepositoryConfig::new("bad").with_default_workspace("system");
        assert!(matches!(
            Repository::start(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_initial_workspaces() {
        let repository = repository();
        assert_eq!(
            repository.workspace_names(),
            vec!["default", "drafts", "system"]
        );
        assert_eq!(repository.default_workspace_name(), "default");
        assert_eq!(repository.system_workspace_name(), "system");
    }

    #[test]
    fn test_workspace_create_and_destroy() {
        let repository = repository();

        assert!(repository.create_workspace("archive").unwrap());
        assert!(!repository.create_workspace("archive").unwrap());
        assert!(repository.has_workspace("archive"));

        assert!(repository.destroy_workspace("archive").unwrap());
        assert!(!repository.destroy_workspace("archive").unwrap());
        assert!(repository.destroy_workspace("system").is_err());
        assert!(repository.destroy_workspace("default").is_err());
        assert!(repository.create_workspace("").is_err());
    }

    #[test]
    fn test_publish_rejects_unknown_workspace() {
        let repository = repository();
        assert!(matches!(
            repository.publish(ChangeSet::for_workspace("nowhere")),
            Err(Error::NoSuchWorkspace(ref w)) if w == "nowhere"
        ));
        assert!(repository.publish(ChangeSet::without_workspace()).is_ok());
        assert!(repository.publish(ChangeSet::for_workspace("drafts")).is_ok());
    }

    #[test]
    fn test_operations_after_shutdown() {
        let repository = repository();
        repository.shutdown();

        assert!(matches!(
            repository.publish(ChangeSet::for_workspace("default")),
            Err(Error::NotRunning)
        ));
        assert!(matches!(
            repository.create_workspace("late"),
            Err(Error::NotRunning)
        ));
    }

    #[test]
    fn test_descriptors() {
        let repository = repository();
        assert_eq!(
            repository.descriptor(REP_NAME_DESC),
            Some(&DescriptorValue::Single("unit".to_string()))
        );
        assert!(!repository.is_single_value_descriptor(QUERY_LANGUAGES));
        assert!(repository.is_standard_descriptor(QUERY_LANGUAGES));
        assert!(repository.descriptor_keys().contains(&REP_NAME_DESC));
    }
}
