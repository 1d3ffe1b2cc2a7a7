//! Worker runner that drains the job queue

use super::base::Worker;
use crate::queue::JobQueue;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Run one worker task until shutdown or until the queue closes
pub async fn run_worker(
    worker: Arc<dyn Worker>,
    queue: Arc<JobQueue>,
    worker_id: String,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    tracing::info!(
        worker_id,
        job_types = ?worker.supported_job_types(),
        "{} listening for jobs",
        worker.name()
    );
    worker.start().await?;

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            next = queue.next() => {
                match next {
                    Some(id) => execute(worker.as_ref(), &queue, &worker_id, id).await,
                    None => break,
                }
            }
        }
    }

    tracing::info!(worker_id, "{} shutdown requested, stopping...", worker.name());
    worker.stop().await
}

async fn execute(worker: &dyn Worker, queue: &JobQueue, worker_id: &str, id: Uuid) {
    let Some(job) = queue.start(id, worker_id) else {
        tracing::debug!(job_id = %id, "Skipping job that is no longer queued");
        return;
    };
    if !worker.supported_job_types().contains(&job.job_type) {
        queue.fail(id, format!("{} cannot run {}", worker.name(), job.job_type));
        return;
    }

    tracing::info!(job_id = %id, job_type = %job.job_type, "{} received job", worker.name());
    match worker.process_job(job).await {
        Ok(result) => {
            tracing::info!(job_id = %id, "{} successfully processed job", worker.name());
            queue.succeed(id, result);
        }
        Err(Error::Cancelled(reason)) => {
            tracing::info!(job_id = %id, reason, "Job cancelled");
            queue.cancelled(id);
        }
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "{} failed to process job", worker.name());
            queue.fail(id, e.to_string());
        }
    }
}

/// Spawn `concurrency` tasks sharing one worker and one queue
pub fn spawn_workers(
    worker: Arc<dyn Worker>,
    queue: Arc<JobQueue>,
    concurrency: usize,
    shutdown: watch::Receiver<bool>,
) -> Vec<tokio::task::JoinHandle<Result<()>>> {
    (0..concurrency.max(1))
        .map(|i| {
            let worker = worker.clone();
            let queue = queue.clone();
            let shutdown = shutdown.clone();
            let worker_id = format!("{}-{i}", worker.name());
            tokio::spawn(async move { run_worker(worker, queue, worker_id, shutdown).await })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{Job, JobStatus, JobType};
    use crate::services::AuditService;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct Scripted;

    #[async_trait]
    impl Worker for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn supported_job_types(&self) -> &[JobType] {
            &[JobType::SyncIcd11, JobType::GenerateMappings]
        }

        async fn start(&self) -> Result<()> {
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }

        async fn process_job(&self, job: Job) -> Result<Value> {
            match job.job_type {
                JobType::SyncIcd11 => Err(Error::Dependency("WHO API unreachable".into())),
                _ => Ok(json!({"created": 2})),
            }
        }
    }

    async fn wait_for_terminal(queue: &JobQueue, id: Uuid) -> Job {
        for _ in 0..100 {
            if let Some(job) = queue.get(id).filter(|j| j.is_complete()) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish");
    }

    #[tokio::test]
    async fn outcomes_land_on_the_job_record() {
        let queue = Arc::new(JobQueue::new(8, 50, AuditService::disabled()));
        let (tx, rx) = watch::channel(false);
        let handles = spawn_workers(Arc::new(Scripted), queue.clone(), 2, rx);

        let ok = queue.enqueue(JobType::GenerateMappings).unwrap();
        let failing = queue.enqueue(JobType::SyncIcd11).unwrap();
        let unsupported = queue.enqueue(JobType::ReloadNamaste).unwrap();

        let ok = wait_for_terminal(&queue, ok.id).await;
        assert_eq!(ok.status, JobStatus::Succeeded);
        assert_eq!(ok.result, Some(json!({"created": 2})));

        let failing = wait_for_terminal(&queue, failing.id).await;
        assert_eq!(failing.status, JobStatus::Failed);
        assert!(failing.error_message.unwrap().contains("WHO API"));

        let unsupported = wait_for_terminal(&queue, unsupported.id).await;
        assert_eq!(unsupported.status, JobStatus::Failed);

        tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }
}
