//! Worker for registry reloads, ICD-11 sync and mapping generation

use super::base::Worker;
use crate::ingestion::{ensure_not_cancelled, Icd11Source, NamasteSource, ProgressSink};
use crate::queue::{Job, JobProgress, JobQueue, JobType};
use crate::services::{AuditService, CodeRegistryService, MappingGenerator};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct AdminWorker {
    queue: Arc<JobQueue>,
    registry: CodeRegistryService,
    generator: MappingGenerator,
    namaste_source: Option<Arc<dyn NamasteSource>>,
    icd11_source: Option<Arc<dyn Icd11Source>>,
    audit: AuditService,
}

impl AdminWorker {
    pub fn new(
        queue: Arc<JobQueue>,
        registry: CodeRegistryService,
        generator: MappingGenerator,
        namaste_source: Option<Arc<dyn NamasteSource>>,
        icd11_source: Option<Arc<dyn Icd11Source>>,
        audit: AuditService,
    ) -> Self {
        Self {
            queue,
            registry,
            generator,
            namaste_source,
            icd11_source,
            audit,
        }
    }

    async fn reload_namaste(&self, progress: &JobProgress) -> Result<Value> {
        let source = self.namaste_source.as_ref().ok_or_else(|| {
            Error::Validation("no NAMASTE source configured (ingestion.namaste_csv)".to_string())
        })?;
        let label = source.describe();
        let codes = source.fetch(progress).await?;
        ensure_not_cancelled(progress)?;

        let total = codes.len() as u64;
        let loaded = self.registry.load_namaste(&label, codes)?;
        progress.report(total, Some(total));
        Ok(json!({ "source": label, "loaded": loaded }))
    }

    async fn sync_icd11(&self, progress: &JobProgress) -> Result<Value> {
        let source = self.icd11_source.as_ref().ok_or_else(|| {
            Error::Validation(
                "no ICD-11 source configured (who_api.enabled or ingestion.icd11_csv)".to_string(),
            )
        })?;
        let label = source.describe();
        self.audit.data_sync(&label, "started");
        let codes = match source.fetch(progress).await {
            Ok(codes) => codes,
            Err(e) => {
                self.audit.data_sync(&label, "failed");
                return Err(e);
            }
        };
        ensure_not_cancelled(progress)?;

        let total = codes.len() as u64;
        let loaded = self.registry.load_icd11(&label, codes)?;
        progress.report(total, Some(total));
        self.audit.data_sync(&label, "completed");
        Ok(json!({ "source": label, "loaded": loaded }))
    }

    async fn generate_mappings(&self, progress: &JobProgress) -> Result<Value> {
        ensure_not_cancelled(progress)?;
        let outcome = self.generator.generate().await?;
        let total = (outcome.created + outcome.already_mapped + outcome.skipped) as u64;
        progress.report(total, Some(total));
        Ok(json!({
            "created": outcome.created,
            "alreadyMapped": outcome.already_mapped,
            "skipped": outcome.skipped,
        }))
    }
}

#[async_trait]
impl Worker for AdminWorker {
    fn name(&self) -> &str {
        "AdminWorker"
    }

    fn supported_job_types(&self) -> &[JobType] {
        &[
            JobType::ReloadNamaste,
            JobType::SyncIcd11,
            JobType::GenerateMappings,
        ]
    }

    async fn start(&self) -> Result<()> {
        tracing::info!("{} starting...", self.name());
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        tracing::info!("{} stopping...", self.name());
        Ok(())
    }

    #[tracing::instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type))]
    async fn process_job(&self, job: Job) -> Result<Value> {
        let progress = JobProgress::new(self.queue.clone(), job.id);
        match job.job_type {
            JobType::ReloadNamaste => self.reload_namaste(&progress).await,
            JobType::SyncIcd11 => self.sync_icd11(&progress).await,
            JobType::GenerateMappings => self.generate_mappings(&progress).await,
        }
    }
}
