//! Shared application state

use crate::config::Config;
use crate::db::{SystemUris, TerminologyStore};
use crate::ingestion::{self, Icd11Source, NamasteSource};
use crate::queue::JobQueue;
use crate::services::{
    AuditService, CodeRegistryService, DualCodingService, FhirService, FhirSettings,
    MappingGenerator, MappingService, SearchLimits, SearchService, TranslationService,
};
use crate::Result;
use std::sync::Arc;

/// Services handed to every request handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<TerminologyStore>,
    pub audit: AuditService,
    pub registry: CodeRegistryService,
    pub mappings: MappingService,
    pub translation: TranslationService,
    pub search: SearchService,
    pub fhir: FhirService,
    pub dual_coding: DualCodingService,
    pub generator: MappingGenerator,
    pub job_queue: Arc<JobQueue>,
    pub namaste_source: Option<Arc<dyn NamasteSource>>,
    pub icd11_source: Option<Arc<dyn Icd11Source>>,
}

impl AppState {
    /// Build the in-memory store and services, with ingestion sources taken from the config
    pub fn new(config: Config) -> Result<Self> {
        let namaste_source = ingestion::namaste_source(&config);
        let icd11_source = ingestion::icd11_source(&config)?;
        Ok(Self::with_sources(config, namaste_source, icd11_source))
    }

    pub fn with_sources(
        config: Config,
        namaste_source: Option<Arc<dyn NamasteSource>>,
        icd11_source: Option<Arc<dyn Icd11Source>>,
    ) -> Self {
        let t = &config.terminology;
        let audit = AuditService::new(config.logging.audit_enabled);
        let store = Arc::new(TerminologyStore::new(
            SystemUris::from_config(t),
            &t.namaste_version,
            &t.mapping_version,
        ));

        let registry = CodeRegistryService::new(store.clone(), audit);
        let mappings = MappingService::new(store.clone(), audit);
        let translation = TranslationService::new(
            store.clone(),
            t.bridge().map(str::to_string),
            t.translation_cache_capacity,
            audit,
        );
        let search = SearchService::new(store.clone(), SearchLimits::from_config(t), audit);
        let settings = FhirSettings::from_config(&config);
        let fhir = FhirService::new(store.clone(), translation.clone(), settings.clone());
        let dual_coding = DualCodingService::new(
            store.clone(),
            translation.clone(),
            search.clone(),
            settings,
            audit,
        );
        let generator = MappingGenerator::new(
            store.clone(),
            mappings.clone(),
            t.generated_confidence,
            audit,
        );
        let job_queue = Arc::new(JobQueue::new(
            config.jobs.queue_capacity,
            config.jobs.history_limit,
            audit,
        ));

        Self {
            config: Arc::new(config),
            store,
            audit,
            registry,
            mappings,
            translation,
            search,
            fhir,
            dual_coding,
            generator,
            job_queue,
            namaste_source,
            icd11_source,
        }
    }
}
