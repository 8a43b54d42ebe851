//! Vellum command-line driver.
//!
//! Starts a repository, publishes change-sets from several threads, shuts the
//! repository down and reports what every listener received.

mod config;
mod driver;
mod error;
mod report;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Args;

fn main() {
    // Logs go to stderr so reports on stdout stay machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vellum=info,vellum_core=info,vellum_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.into_config();

    tracing::info!(
        repository = %config.repository.name,
        publishers = config.publishers,
        events = config.events_per_publisher,
        listeners = config.listeners,
        failing_listeners = config.failing_listeners,
        policy = %config.repository.bus.shutdown_policy,
        "configuration loaded"
    );

    let report = match driver::run(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match report.render(config.format) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }

    if report.has_violations() {
        tracing::error!(violations = report.violations(), "ordering violations detected");
        std::process::exit(1);
    }
}
