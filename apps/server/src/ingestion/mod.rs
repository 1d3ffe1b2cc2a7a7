//! Data sources feeding the Code Registry
//!
//! Sources only produce upsert payloads; the registry service stores them as
//! one batch. Long fetches report progress and stop early when their job is
//! cancelled.

pub mod csv;
pub mod who;

use crate::config::Config;
use crate::models::{NewIcd11Code, NewNamasteCode};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub use self::csv::{CsvIcd11Source, CsvNamasteSource};
pub use self::who::WhoIcd11Source;

/// Progress reporting and advisory cancellation for a running fetch
pub trait ProgressSink: Send + Sync {
    fn report(&self, processed: u64, total: Option<u64>);
    fn is_cancelled(&self) -> bool;
}

/// Sink for fetches that are not tracked by a job
#[derive(Debug, Default, Clone, Copy)]
pub struct Untracked;

impl ProgressSink for Untracked {
    fn report(&self, _processed: u64, _total: Option<u64>) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

pub(crate) fn ensure_not_cancelled(progress: &dyn ProgressSink) -> Result<()> {
    if progress.is_cancelled() {
        return Err(Error::Cancelled("fetch stopped on request".to_string()));
    }
    Ok(())
}

#[async_trait]
pub trait NamasteSource: Send + Sync {
    /// Label used in logs and audit events
    fn describe(&self) -> String;

    async fn fetch(&self, progress: &dyn ProgressSink) -> Result<Vec<NewNamasteCode>>;
}

#[async_trait]
pub trait Icd11Source: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch(&self, progress: &dyn ProgressSink) -> Result<Vec<NewIcd11Code>>;
}

/// NAMASTE source from `ingestion.namaste_csv`
pub fn namaste_source(config: &Config) -> Option<Arc<dyn NamasteSource>> {
    config
        .ingestion
        .namaste_csv
        .clone()
        .map(|path| Arc::new(CsvNamasteSource::new(path)) as Arc<dyn NamasteSource>)
}

/// The WHO API when enabled, otherwise `ingestion.icd11_csv`
pub fn icd11_source(config: &Config) -> Result<Option<Arc<dyn Icd11Source>>> {
    if config.who_api.enabled {
        let source = WhoIcd11Source::new(config.who_api.clone())?;
        return Ok(Some(Arc::new(source)));
    }
    Ok(config
        .ingestion
        .icd11_csv
        .clone()
        .map(|path| Arc::new(CsvIcd11Source::new(path)) as Arc<dyn Icd11Source>))
}
