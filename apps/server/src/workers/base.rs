//! Base worker trait

use crate::queue::{Job, JobType};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Base trait for background workers
#[async_trait]
pub trait Worker: Send + Sync {
    /// Worker name for logging
    fn name(&self) -> &str;

    fn supported_job_types(&self) -> &[JobType];

    async fn start(&self) -> Result<()>;

    /// Stop the worker gracefully
    async fn stop(&self) -> Result<()>;

    /// Process a single job and return the summary stored on the job record.
    /// `Error::Cancelled` marks the job cancelled instead of failed.
    async fn process_job(&self, job: Job) -> Result<Value>;
}
