//! Driver configuration.

use clap::{Parser, ValueEnum};
use vellum::{RepositoryConfig, ShutdownPolicy};

use crate::report::OutputFormat;

/// Default number of publisher threads.
pub const DEFAULT_PUBLISHERS: usize = 4;

/// Default number of change-sets each publisher commits.
pub const DEFAULT_EVENTS: usize = 1000;

/// Default number of well-behaved listeners.
pub const DEFAULT_LISTENERS: usize = 3;

/// Shutdown policy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Deliver everything already queued before stopping
    Drain,
    /// Abandon queued change-sets
    Discard,
}

impl From<PolicyArg> for ShutdownPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Drain => ShutdownPolicy::Drain,
            PolicyArg::Discard => ShutdownPolicy::Discard,
        }
    }
}

/// Command-line arguments for the driver.
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(version, about = "Publish change-sets through a Vellum repository and report delivery", long_about = None)]
pub struct Args {
    /// Repository name.
    #[arg(long, default_value = "vellum")]
    pub name: String,

    /// Extra workspaces to create, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub workspaces: Vec<String>,

    /// Number of publisher threads.
    #[arg(long, default_value_t = DEFAULT_PUBLISHERS)]
    pub publishers: usize,

    /// Change-sets committed by each publisher.
    #[arg(long, default_value_t = DEFAULT_EVENTS)]
    pub events: usize,

    /// Number of listeners that count deliveries and check ordering.
    #[arg(long, default_value_t = DEFAULT_LISTENERS)]
    pub listeners: usize,

    /// Number of listeners that reject every change-set.
    #[arg(long, default_value_t = 0)]
    pub failing_listeners: usize,

    /// What to do with queued change-sets at shutdown.
    #[arg(long, value_enum, default_value_t = PolicyArg::Drain)]
    pub policy: PolicyArg,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Everything a driver run needs.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub repository: RepositoryConfig,
    pub publishers: usize,
    pub events_per_publisher: usize,
    pub listeners: usize,
    pub failing_listeners: usize,
    pub format: OutputFormat,
}

impl DriverConfig {
    /// Workspaces publishers spread their change-sets over.
    pub fn target_workspaces(&self) -> Vec<String> {
        let mut targets = vec![self.repository.default_workspace_name.clone()];
        for workspace in &self.repository.predefined_workspaces {
            if !targets.contains(workspace) {
                targets.push(workspace.clone());
            }
        }
        targets
    }
}

impl Args {
    /// Convert command-line arguments to a driver configuration.
    pub fn into_config(self) -> DriverConfig {
        let repository = self
            .workspaces
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .fold(RepositoryConfig::new(self.name), |config, w| {
                config.with_workspace(w)
            })
            .with_shutdown_policy(self.policy.into());

        DriverConfig {
            repository,
            publishers: self.publishers.max(1),
            events_per_publisher: self.events,
            listeners: self.listeners,
            failing_listeners: self.failing_listeners,
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let config = Args::parse_from(["vellum"]).into_config();

        assert_eq!(config.repository.name, "vellum");
        assert_eq!(config.repository.bus.shutdown_policy, ShutdownPolicy::Drain);
        assert_eq!(config.publishers, DEFAULT_PUBLISHERS);
        assert_eq!(config.events_per_publisher, DEFAULT_EVENTS);
        assert_eq!(config.listeners, DEFAULT_LISTENERS);
        assert_eq!(config.failing_listeners, 0);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.target_workspaces(), vec!["default"]);
    }

    #[test]
    fn test_args_into_config() {
        let config = Args::parse_from([
            "vellum",
            "--name",
            "content",
            "--workspaces",
            "drafts, archive,,default",
            "--publishers",
            "0",
            "--events",
            "10",
            "--failing-listeners",
            "2",
            "--policy",
            "discard",
            "--format",
            "json",
        ])
        .into_config();

        assert_eq!(config.repository.name, "content");
        assert_eq!(
            config.repository.predefined_workspaces,
            vec!["drafts", "archive", "default"]
        );
        assert_eq!(config.target_workspaces(), vec!["default", "drafts", "archive"]);
        assert_eq!(config.publishers, 1);
        assert_eq!(config.events_per_publisher, 10);
        assert_eq!(config.failing_listeners, 2);
        assert_eq!(config.repository.bus.shutdown_policy, ShutdownPolicy::Discard);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(Args::try_parse_from(["vellum", "--policy", "later"]).is_err());
    }
}
