//! Repository configuration.

use vellum_core::{BusConfig, ShutdownPolicy};

use crate::error::{Error, Result};

/// Default name of the administrative workspace.
pub const DEFAULT_SYSTEM_WORKSPACE: &str = "system";

/// Default name of the workspace used when none is given.
pub const DEFAULT_WORKSPACE: &str = "default";

/// Repository configuration.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Repository name, reported through the name descriptor.
    pub name: String,

    /// Administrative workspace; workspace lifecycle changes are published on it.
    pub system_workspace_name: String,

    /// Workspace used by callers that do not name one.
    pub default_workspace_name: String,

    /// Additional workspaces created at startup.
    pub predefined_workspaces: Vec<String>,

    /// Change bus settings. The system workspace name is filled in at startup.
    pub bus: BusConfig,
}

impl RepositoryConfig {
    /// Create a configuration for a named repository.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            bus: BusConfig::default().with_worker_name(format!("{}-change-bus", name)),
            name,
            system_workspace_name: DEFAULT_SYSTEM_WORKSPACE.to_string(),
            default_workspace_name: DEFAULT_WORKSPACE.to_string(),
            predefined_workspaces: Vec::new(),
        }
    }

    /// Set the system workspace name.
    pub fn with_system_workspace(mut self, name: impl Into<String>) -> Self {
        self.system_workspace_name = name.into();
        self
    }

    /// Set the default workspace name.
    pub fn with_default_workspace(mut self, name: impl Into<String>) -> Self {
        self.default_workspace_name = name.into();
        self
    }

    /// Add a workspace to create at startup.
    pub fn with_workspace(mut self, name: impl Into<String>) -> Self {
        self.predefined_workspaces.push(name.into());
        self
    }

    /// Set the change bus shutdown policy.
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.bus.shutdown_policy = policy;
        self
    }

    /// Replace the change bus settings.
    pub fn with_bus_config(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Get every workspace name the repository starts with.
    pub fn initial_workspaces(&self) -> Vec<String> {
        let mut names = vec![
            self.system_workspace_name.clone(),
            self.default_workspace_name.clone(),
        ];
        for name in &self.predefined_workspaces {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Check the configuration for obvious mistakes.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("repository name must not be empty".to_string()));
        }
        if self.system_workspace_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "system workspace name must not be empty".to_string(),
            ));
        }
        if self.default_workspace_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "default workspace name must not be empty".to_string(),
            ));
        }
        if self.system_workspace_name == self.default_workspace_name {
            return Err(Error::InvalidConfig(format!(
                "system and default workspace are both '{}'",
                self.system_workspace_name
            )));
        }
        if let Some(blank) = self.predefined_workspaces.iter().find(|w| w.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "invalid workspace name '{}'",
                blank
            )));
        }
        self.bus.validate()?;
        Ok(())
    }

    /// Get the bus configuration with the system workspace applied.
    pub(crate) fn bus_config(&self) -> BusConfig {
        self.bus
            .clone()
            .with_system_workspace(self.system_workspace_name.clone())
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::new("vellum")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.name, "vellum");
        assert_eq!(config.system_workspace_name, DEFAULT_SYSTEM_WORKSPACE);
        assert_eq!(config.default_workspace_name, DEFAULT_WORKSPACE);
        assert_eq!(config.bus.worker_name, "vellum-change-bus");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = RepositoryConfig::new("content")
            .with_system_workspace("admin")
            .with_default_workspace("main")
            .with_workspace("drafts")
            .with_workspace("main")
            .with_shutdown_policy(ShutdownPolicy::Discard);

        assert_eq!(config.initial_workspaces(), vec!["admin", "main", "drafts"]);
        assert_eq!(config.bus.shutdown_policy, ShutdownPolicy::Discard);
        assert_eq!(config.bus_config().system_workspace_name.as_deref(), Some("admin"));
    }

    #[test]
    fn test_validation() {
        assert!(RepositoryConfig::new("").validate().is_err());
        assert!(RepositoryConfig::default()
            .with_system_workspace("same")
            .with_default_workspace("same")
            .validate()
            .is_err());
        assert!(RepositoryConfig::default().with_workspace(" ").validate().is_err());
        assert!(RepositoryConfig::default()
            .with_bus_config(BusConfig::default().with_worker_name(""))
            .validate()
            .is_err());
    }
}
