//! Terminology server entry point

use anyhow::Context;
use ayush_terminology::{api::create_router, background, config::Config, logging, state::AppState};
use clap::Parser;
use validator::Validate;

#[derive(Debug, Parser)]
#[clap(name = "terminology-server", version, about = "NAMASTE <-> ICD-11 terminology server")]
struct Cli {
    /// Config file (yaml, toml or json); defaults to ./config.* when present
    #[clap(short, long)]
    config: Option<String>,

    /// Override server.host
    #[clap(long)]
    host: Option<String>,

    /// Override server.port
    #[clap(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first to get logging settings
    let mut config =
        Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let _telemetry_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging/telemetry")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.logging.deployment_environment,
        "Starting terminology server"
    );

    let addr = config
        .socket_addr()
        .context("Failed to determine socket address")?;

    let state = AppState::new(config).context("Failed to initialize application state")?;
    background::initial_load(&state).await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let workers = background::start_workers(&state, shutdown_rx);

    let app = create_router(state);

    tracing::info!("Terminology server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("FHIR endpoint: http://{}/fhir", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {addr}"))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Running jobs finish their current step; queued ones are dropped with the process.
    let _ = shutdown_tx.send(true);
    for joined in futures::future::join_all(workers).await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Worker stopped with error"),
            Err(e) => tracing::warn!(error = %e, "Worker task panicked"),
        }
    }

    if let Err(e) = served {
        tracing::error!(error = %e, "Server terminated unexpectedly");
        logging::shutdown_telemetry();
        return Err(e.into());
    }

    tracing::info!("Server shutdown complete");
    logging::shutdown_telemetry();

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, starting graceful shutdown...");
        }
        _ = sigterm.recv() => {
            tracing::info!("SIGTERM received, starting graceful shutdown...");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
