//! Admin job endpoints

use crate::queue::{Job, JobType};
use crate::state::AppState;
use crate::{Error, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

fn parse_job_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| Error::InvalidParameter(format!("invalid job id '{raw}'")))
}

fn enqueue(state: &AppState, job_type: JobType) -> Result<(StatusCode, Json<Job>)> {
    let job = state.job_queue.enqueue(job_type)?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// POST /terminology/admin/generate-mappings
pub async fn generate_mappings(State(state): State<AppState>) -> Result<(StatusCode, Json<Job>)> {
    enqueue(&state, JobType::GenerateMappings)
}

/// POST /terminology/admin/reload-namaste
pub async fn reload_namaste(State(state): State<AppState>) -> Result<(StatusCode, Json<Job>)> {
    enqueue(&state, JobType::ReloadNamaste)
}

/// POST /terminology/admin/sync-icd11
pub async fn sync_icd11(State(state): State<AppState>) -> Result<(StatusCode, Json<Job>)> {
    enqueue(&state, JobType::SyncIcd11)
}

/// GET /terminology/admin/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.job_queue.list())
}

/// GET /terminology/admin/jobs/{id}
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>> {
    let id = parse_job_id(&id)?;
    state
        .job_queue
        .get(id)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("job {id}")))
}

/// POST /terminology/admin/jobs/{id}/cancel
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>> {
    let id = parse_job_id(&id)?;
    Ok(Json(state.job_queue.request_cancel(id)?))
}
