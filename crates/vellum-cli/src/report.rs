//! Run reports.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde::Serialize;
use vellum::BusStatsSnapshot;

use crate::error::Result;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Text,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// What one listener saw during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerReport {
    pub name: String,
    pub received: u64,
    pub violations: u64,
    pub failing: bool,
}

/// Outcome of a driver run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub repository: String,
    pub policy: String,
    pub publishers: usize,
    pub events_per_publisher: usize,
    pub elapsed_ms: u64,
    pub listeners: Vec<ListenerReport>,
    pub stats: BusStatsSnapshot,
}

impl Report {
    /// Total ordering violations across all listeners.
    pub fn violations(&self) -> u64 {
        self.listeners.iter().map(|l| l.violations).sum()
    }

    pub fn has_violations(&self) -> bool {
        self.violations() > 0
    }

    /// Render the report in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn render_text(&self) -> String {
        let mut listeners = Table::new();
        listeners.set_header(vec!["listener", "received", "violations", "failing"]);
        for listener in &self.listeners {
            listeners.add_row(vec![
                Cell::new(&listener.name),
                Cell::new(listener.received),
                Cell::new(listener.violations),
                Cell::new(if listener.failing { "yes" } else { "no" }),
            ]);
        }

        let mut stats = Table::new();
        stats.set_header(vec!["counter", "value"]);
        for (name, value) in [
            ("published", self.stats.published),
            ("dropped", self.stats.dropped),
            ("deliveries", self.stats.deliveries),
            ("listener failures", self.stats.listener_failures),
            ("registrations", self.stats.registrations),
            ("unregistrations", self.stats.unregistrations),
        ] {
            stats.add_row(vec![Cell::new(name), Cell::new(value)]);
        }

        format!(
            "repository '{}' ({} policy): {} publishers x {} change-sets in {} ms\n{}\n{}\nordering violations: {}",
            self.repository,
            self.policy,
            self.publishers,
            self.events_per_publisher,
            self.elapsed_ms,
            listeners,
            stats,
            self.violations()
        )
    }
}
