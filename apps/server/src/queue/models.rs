//! Job queue domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Administrative jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    /// Reload NAMASTE codes from the configured source
    ReloadNamaste,
    /// Refresh ICD-11 codes from the WHO API or CSV
    SyncIcd11,
    /// Create mappings from ingestion crosswalk hints
    GenerateMappings,
}

impl JobType {
    pub fn job_type_name(&self) -> &'static str {
        match self {
            JobType::ReloadNamaste => "reload-namaste",
            JobType::SyncIcd11 => "sync-icd11",
            JobType::GenerateMappings => "generate-mappings",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.job_type_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub processed_items: u64,
    pub total_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub cancel_requested: bool,
    /// Summary written by the worker on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub worker_id: Option<String>,
}

impl Job {
    pub fn new(job_type: JobType) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type,
            status: JobStatus::Queued,
            processed_items: 0,
            total_items: None,
            error_message: None,
            cancel_requested: false,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            worker_id: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn progress_percent(&self) -> Option<f64> {
        match self.total_items {
            Some(total) if total > 0 => {
                Some((self.processed_items as f64 / total as f64) * 100.0)
            }
            _ => None,
        }
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        Some((completed - started).num_milliseconds() as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let job = Job::new(JobType::GenerateMappings);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobType"], "generate-mappings");
        assert_eq!(value["status"], "queued");
        assert_eq!(value["cancelRequested"], false);
        assert!(value.get("errorMessage").is_none());
    }

    #[test]
    fn progress_needs_a_total() {
        let mut job = Job::new(JobType::SyncIcd11);
        job.processed_items = 5;
        assert_eq!(job.progress_percent(), None);
        job.total_items = Some(20);
        assert_eq!(job.progress_percent(), Some(25.0));
    }
}
