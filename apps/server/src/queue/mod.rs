//! In-memory job queue for administrative jobs
//!
//! Job records live in a map for status polling; job ids travel over a bounded
//! tokio mpsc channel to the worker tasks. A full channel rejects the enqueue.

mod models;

pub use models::*;

use crate::ingestion::ProgressSink;
use crate::metrics::{JOBS_COMPLETED_TOTAL, JOBS_ENQUEUED_TOTAL, JOB_DURATION_SECONDS};
use crate::services::AuditService;
use crate::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

pub struct JobQueue {
    jobs: DashMap<Uuid, Job>,
    sender: mpsc::Sender<Uuid>,
    receiver: Mutex<mpsc::Receiver<Uuid>>,
    history_limit: usize,
    audit: AuditService,
}

impl JobQueue {
    pub fn new(capacity: usize, history_limit: usize, audit: AuditService) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            jobs: DashMap::new(),
            sender,
            receiver: Mutex::new(receiver),
            history_limit,
            audit,
        }
    }

    fn transition(&self, job: &Job) {
        self.audit.job_transition(
            &job.id.to_string(),
            job.job_type.job_type_name(),
            job.status.as_str(),
        );
    }

    /// Record a queued job and hand it to the workers
    pub fn enqueue(&self, job_type: JobType) -> Result<Job> {
        let job = Job::new(job_type);
        self.jobs.insert(job.id, job.clone());
        if let Err(e) = self.sender.try_send(job.id) {
            self.jobs.remove(&job.id);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::JobQueue("job queue is full, try again later".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    Error::JobQueue("job queue is not accepting jobs".to_string())
                }
            });
        }
        JOBS_ENQUEUED_TOTAL
            .with_label_values(&[job_type.job_type_name()])
            .inc();
        self.transition(&job);
        tracing::info!(job_id = %job.id, job_type = %job_type, "Job enqueued");
        self.prune();
        Ok(job)
    }

    /// Next job id; `None` once every sender is gone
    pub async fn next(&self) -> Option<Uuid> {
        self.receiver.lock().await.recv().await
    }

    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.get(&id).map(|j| j.clone())
    }

    /// All known jobs, newest first
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|j| j.clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Queued jobs are cancelled at once; running jobs see the flag between records
    pub fn request_cancel(&self, id: Uuid) -> Result<Job> {
        let mut job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("job {id}")))?;
        match job.status {
            JobStatus::Queued => {
                job.cancel_requested = true;
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
                JOBS_COMPLETED_TOTAL
                    .with_label_values(&[job.job_type.job_type_name(), "cancelled"])
                    .inc();
            }
            JobStatus::Running => job.cancel_requested = true,
            status => {
                return Err(Error::Conflict(format!(
                    "job {id} already {}",
                    status.as_str()
                )))
            }
        }
        let snapshot = job.clone();
        drop(job);
        self.transition(&snapshot);
        Ok(snapshot)
    }

    /// Claim a job for a worker. Cancelled or unknown jobs return `None`.
    pub fn start(&self, id: Uuid, worker_id: &str) -> Option<Job> {
        let mut job = self.jobs.get_mut(&id)?;
        if job.status != JobStatus::Queued {
            return None;
        }
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        job.worker_id = Some(worker_id.to_string());
        let snapshot = job.clone();
        drop(job);
        self.transition(&snapshot);
        Some(snapshot)
    }

    pub fn report_progress(&self, id: Uuid, processed: u64, total: Option<u64>) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.processed_items = processed;
            if total.is_some() {
                job.total_items = total;
            }
        }
    }

    pub fn is_cancel_requested(&self, id: Uuid) -> bool {
        self.jobs.get(&id).map_or(false, |j| j.cancel_requested)
    }

    fn finish(&self, id: Uuid, status: JobStatus, update: impl FnOnce(&mut Job)) {
        let Some(mut job) = self.jobs.get_mut(&id) else {
            return;
        };
        job.status = status;
        job.completed_at = Some(Utc::now());
        update(&mut job);
        let snapshot = job.clone();
        drop(job);

        let name = snapshot.job_type.job_type_name();
        JOBS_COMPLETED_TOTAL
            .with_label_values(&[name, status.as_str()])
            .inc();
        if let Some(seconds) = snapshot.duration_seconds() {
            JOB_DURATION_SECONDS
                .with_label_values(&[name])
                .observe(seconds);
        }
        self.transition(&snapshot);
    }

    pub fn succeed(&self, id: Uuid, result: serde_json::Value) {
        self.finish(id, JobStatus::Succeeded, |job| job.result = Some(result));
    }

    pub fn fail(&self, id: Uuid, message: impl Into<String>) {
        let message = message.into();
        self.finish(id, JobStatus::Failed, |job| job.error_message = Some(message));
    }

    pub fn cancelled(&self, id: Uuid) {
        self.finish(id, JobStatus::Cancelled, |_| {});
    }

    /// Drop the oldest finished records beyond the history limit
    fn prune(&self) {
        let mut finished: Vec<(chrono::DateTime<Utc>, Uuid)> = self
            .jobs
            .iter()
            .filter(|j| j.is_complete())
            .map(|j| (j.created_at, j.id))
            .collect();
        if finished.len() <= self.history_limit {
            return;
        }
        finished.sort();
        let excess = finished.len() - self.history_limit;
        for (_, id) in finished.into_iter().take(excess) {
            self.jobs.remove(&id);
        }
    }
}

/// Progress sink that writes into a job record
#[derive(Clone)]
pub struct JobProgress {
    queue: Arc<JobQueue>,
    job_id: Uuid,
}

impl JobProgress {
    pub fn new(queue: Arc<JobQueue>, job_id: Uuid) -> Self {
        Self { queue, job_id }
    }
}

impl ProgressSink for JobProgress {
    fn report(&self, processed: u64, total: Option<u64>) {
        self.queue.report_progress(self.job_id, processed, total);
    }

    fn is_cancelled(&self) -> bool {
        self.queue.is_cancel_requested(self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize) -> JobQueue {
        JobQueue::new(capacity, 10, AuditService::disabled())
    }

    #[test]
    fn full_queue_rejects_enqueue() {
        let queue = queue(1);
        tokio_test::assert_ok!(queue.enqueue(JobType::SyncIcd11));
        let err = tokio_test::assert_err!(queue.enqueue(JobType::GenerateMappings));
        assert!(matches!(err, Error::JobQueue(_)));
        assert_eq!(queue.list().len(), 1);
    }

    #[tokio::test]
    async fn lifecycle_moves_through_statuses() {
        let queue = queue(4);
        let job = queue.enqueue(JobType::ReloadNamaste).unwrap();
        let id = queue.next().await.unwrap();
        assert_eq!(id, job.id);

        let running = queue.start(id, "worker-0").unwrap();
        assert_eq!(running.status, JobStatus::Running);
        queue.report_progress(id, 3, Some(6));
        assert_eq!(queue.get(id).unwrap().progress_percent(), Some(50.0));

        queue.succeed(id, serde_json::json!({"loaded": 6}));
        let done = queue.get(id).unwrap();
        assert_eq!(done.status, JobStatus::Succeeded);
        assert!(done.completed_at.is_some());
        assert!(matches!(queue.request_cancel(id), Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn cancelling_a_queued_job_skips_it() {
        let queue = Arc::new(queue(4));
        let job = queue.enqueue(JobType::SyncIcd11).unwrap();
        let cancelled = queue.request_cancel(job.id).unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        let id = queue.next().await.unwrap();
        assert!(queue.start(id, "worker-0").is_none());
    }

    #[test]
    fn running_jobs_see_the_cancel_flag() {
        let queue = Arc::new(queue(4));
        let job = queue.enqueue(JobType::SyncIcd11).unwrap();
        queue.start(job.id, "worker-0").unwrap();
        let progress = JobProgress::new(queue.clone(), job.id);
        assert!(!progress.is_cancelled());
        queue.request_cancel(job.id).unwrap();
        assert!(progress.is_cancelled());
    }
}
