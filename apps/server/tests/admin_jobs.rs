//! Administrative jobs (`/terminology/admin/...`)
//!
//! Tests cover:
//! - Enqueue returns 202 with a queued job record
//! - Workers run reload, generation and sync jobs to a terminal status
//! - Cancellation of queued jobs and conflicts on finished ones
//! - Back-pressure when the queue is full

#![allow(unused)]
#[allow(unused)]
mod support;

use anyhow::Context as _;
use axum::http::{Method, StatusCode};
use ayush_terminology::{
    background::start_workers,
    ingestion::{CsvNamasteSource, NamasteSource},
    models::{Icd11CodeType, NewIcd11Code},
    Config,
};
use serde_json::{json, Value};
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;
use support::{assert_outcome, assert_status, parse_json, TestApp, NAMASTE_CSV};
use tokio::sync::watch;

async fn enqueue(app: &TestApp, path: &str) -> anyhow::Result<Value> {
    let (status, _, body) = app.request(Method::POST, path, None).await?;
    assert_status(status, StatusCode::ACCEPTED, path);
    let job = parse_json(&body)?;
    assert_eq!(job["status"], "queued");
    Ok(job)
}

/// Poll a job until it reaches a terminal status
async fn wait_for(app: &TestApp, job: &Value) -> anyhow::Result<Value> {
    let id = job["id"].as_str().context("job id")?;
    for _ in 0..200 {
        let (status, current) = app.get_json(&format!("/terminology/admin/jobs/{id}")).await?;
        assert_status(status, StatusCode::OK, "poll job");
        if matches!(
            current["status"].as_str(),
            Some("succeeded" | "failed" | "cancelled")
        ) {
            return Ok(current);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    anyhow::bail!("job {id} did not finish")
}

fn csv_app() -> anyhow::Result<(TestApp, tempfile::NamedTempFile)> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(NAMASTE_CSV.as_bytes())?;
    let source: Arc<dyn NamasteSource> = Arc::new(CsvNamasteSource::new(file.path()));
    let app = TestApp::with_sources(Config::default(), Some(source), None);
    Ok((app, file))
}

#[tokio::test]
async fn reload_then_generate_mappings() -> anyhow::Result<()> {
    let (app, _csv) = csv_app()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = start_workers(&app.state, shutdown_rx);

    let reload = enqueue(&app, "/terminology/admin/reload-namaste").await?;
    assert_eq!(reload["jobType"], "reload-namaste");
    let reload = wait_for(&app, &reload).await?;
    assert_eq!(reload["status"], "succeeded", "{reload}");
    assert_eq!(reload["result"]["loaded"], 3);

    let (status, _) = app.get_json("/terminology/namaste/AYURVEDA/AAE-17").await?;
    assert_status(status, StatusCode::OK, "reloaded code");

    app.state.registry.load_icd11(
        "fixtures",
        vec![
            NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Fever disorder (TM2)"),
            NewIcd11Code::new(Icd11CodeType::Tm2, "SK01", "Heat pattern (TM2)"),
            NewIcd11Code::new(Icd11CodeType::Biomedicine, "MG26", "Fever of unknown origin"),
        ],
    )?;

    let generate = enqueue(&app, "/terminology/admin/generate-mappings").await?;
    let generate = wait_for(&app, &generate).await?;
    assert_eq!(generate["status"], "succeeded", "{generate}");
    assert_eq!(generate["result"]["created"], 3);

    let (_, matches) = app
        .get_json("/terminology/translate/namaste-to-tm2/AAE-17")
        .await?;
    assert_eq!(matches[0]["targetCode"], "SK01");
    assert_eq!(matches[0]["origin"], "GENERATED");
    let confidence = matches[0]["confidenceScore"].as_f64().unwrap_or(1.0);
    assert!(confidence < 1.0, "generated confidence {confidence}");

    let (_, jobs) = app.get_json("/terminology/admin/jobs").await?;
    assert_eq!(jobs.as_array().map(Vec::len), Some(2));
    assert_eq!(jobs[0]["jobType"], "generate-mappings");

    shutdown_tx.send(true)?;
    for worker in workers {
        worker.await??;
    }
    Ok(())
}

#[tokio::test]
async fn sync_without_a_source_fails_the_job() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let _workers = start_workers(&app.state, shutdown_rx);

    let job = enqueue(&app, "/terminology/admin/sync-icd11").await?;
    let job = wait_for(&app, &job).await?;
    assert_eq!(job["status"], "failed");
    assert!(job["errorMessage"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(job["completedAt"].is_string());

    shutdown_tx.send(true)?;
    Ok(())
}

#[tokio::test]
async fn queued_jobs_can_be_cancelled_once() -> anyhow::Result<()> {
    let app = TestApp::new();

    let job = enqueue(&app, "/terminology/admin/generate-mappings").await?;
    let id = job["id"].as_str().context("job id")?;

    let (status, _, body) = app
        .request(Method::POST, &format!("/terminology/admin/jobs/{id}/cancel"), None)
        .await?;
    assert_status(status, StatusCode::OK, "cancel");
    let cancelled = parse_json(&body)?;
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancelRequested"], true);

    let (status, _, body) = app
        .request(Method::POST, &format!("/terminology/admin/jobs/{id}/cancel"), None)
        .await?;
    assert_status(status, StatusCode::CONFLICT, "cancel twice");
    assert_outcome(&parse_json(&body)?, "conflict")?;
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_job_ids() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, _) = app
        .get_json("/terminology/admin/jobs/5f0c6f9e-8d4b-4c1e-9a53-2f7b1c0d9e11")
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown job");

    let (status, outcome) = app.get_json("/terminology/admin/jobs/not-a-uuid").await?;
    assert_status(status, StatusCode::BAD_REQUEST, "malformed id");
    assert_outcome(&outcome, "invalid")?;
    Ok(())
}

#[tokio::test]
async fn full_queue_pushes_back() -> anyhow::Result<()> {
    let mut config = Config::default();
    config.jobs.queue_capacity = 1;
    let app = TestApp::with_sources(config, None, None);

    enqueue(&app, "/terminology/admin/reload-namaste").await?;
    let (status, _, body) = app
        .request(Method::POST, "/terminology/admin/sync-icd11", None)
        .await?;
    assert_status(status, StatusCode::SERVICE_UNAVAILABLE, "queue full");
    assert_outcome(&parse_json(&body)?, "transient")?;
    Ok(())
}
