//! Background tasks and worker management
//!
//! Worker tasks drain the in-memory job queue. The startup load runs inline
//! before the listener binds, so the first request already sees the data.

use crate::ingestion::Untracked;
use crate::state::AppState;
use crate::workers::{spawn_workers, AdminWorker};
use crate::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Start the admin worker tasks
pub fn start_workers(
    state: &AppState,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<Result<()>>> {
    let worker = AdminWorker::new(
        state.job_queue.clone(),
        state.registry.clone(),
        state.generator.clone(),
        state.namaste_source.clone(),
        state.icd11_source.clone(),
        state.audit,
    );
    let concurrency = state.config.jobs.worker_concurrency;
    let handles = spawn_workers(
        Arc::new(worker),
        state.job_queue.clone(),
        concurrency,
        shutdown,
    );
    tracing::info!(concurrency, "Background workers started and listening for jobs");
    handles
}

/// Load configured sources and optionally generate mappings.
///
/// Failures are logged and leave the store as it was; the server still starts.
pub async fn initial_load(state: &AppState) {
    let ingestion = &state.config.ingestion;
    if !ingestion.load_on_startup {
        return;
    }

    if let Some(source) = &state.namaste_source {
        let label = source.describe();
        match source.fetch(&Untracked).await {
            Ok(codes) => match state.registry.load_namaste(&label, codes) {
                Ok(count) => tracing::info!(source = %label, count, "Loaded NAMASTE codes"),
                Err(e) => tracing::error!(source = %label, error = %e, "NAMASTE load rejected"),
            },
            Err(e) => tracing::error!(source = %label, error = %e, "NAMASTE fetch failed"),
        }
    }

    if let Some(source) = &state.icd11_source {
        let label = source.describe();
        match source.fetch(&Untracked).await {
            Ok(codes) => match state.registry.load_icd11(&label, codes) {
                Ok(count) => tracing::info!(source = %label, count, "Loaded ICD-11 codes"),
                Err(e) => tracing::error!(source = %label, error = %e, "ICD-11 load rejected"),
            },
            Err(e) => tracing::error!(source = %label, error = %e, "ICD-11 fetch failed"),
        }
    }

    if ingestion.generate_mappings_on_startup {
        if let Err(e) = state.generator.generate().await {
            tracing::error!(error = %e, "Startup mapping generation failed");
        }
    }

    let stats = state.registry.stats();
    tracing::info!(
        namaste = stats.namaste_code_count,
        icd11 = stats.icd11_code_count,
        mappings = stats.mapping_count,
        "Startup load finished"
    );
}
