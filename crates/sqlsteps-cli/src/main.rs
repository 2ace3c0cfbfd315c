//! # sqlsteps
//!
//! Applies the SQL scripts of a migrations directory to a SQLite or
//! PostgreSQL database and prints a JSON report of what ran.

mod config;
mod runner;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sqlsteps_core::CancelFlag;

use crate::config::RunConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlsteps=debug")),
        )
        .init();

    info!("Starting sqlsteps v{}", env!("CARGO_PKG_VERSION"));

    let config = RunConfig::from_env();
    info!(?config, "Loaded configuration");

    let cancel = CancelFlag::new();
    let run = runner::run_blocking(config, cancel.clone());
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, rolling back the current migration");
            cancel.cancel();
            run.await
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Migration run failed");
            return Err(e);
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
