//! Operator console for the terminology registry
//!
//! Loads the configured sources into memory, runs one command and exits.
//!
//! Usage:
//!   cargo run --bin terminology-cli -- --namaste-csv data/namaste.csv --icd11-csv data/icd11.csv search-namaste jvara
//!   cargo run --bin terminology-cli -- generate-mappings

use anyhow::{Context, Result};
use ayush_terminology::cli::{self, CliArgs};
use ayush_terminology::{background, AppState, Config};
use clap::Parser;
use validator::Validate;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,ayush_terminology=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let mut config =
        Config::load_from(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let state = AppState::new(config).context("Failed to build application state")?;
    background::initial_load(&state).await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(&state, args.command, &mut out).await
}
