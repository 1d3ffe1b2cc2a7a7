//! Mapping generation from ingestion crosswalk hints

use crate::db::{GeneratedBatch, Snapshot, TerminologyStore};
use crate::models::{Equivalence, MappingDraft, MappingKey, MappingOrigin};
use crate::services::{AuditService, MappingService};
use crate::Result;
use std::sync::Arc;

/// One draft per hint: TM2 hints are EQUIVALENT, biomedicine hints RELATEDTO
pub fn drafts_from_hints(snapshot: &Snapshot, confidence: f64) -> Vec<MappingDraft> {
    let systems = snapshot.systems();
    let mut drafts = Vec::new();
    for record in snapshot.registry().list_namaste(None) {
        let hinted = [
            (&record.hints.icd11_tm2_code, &systems.tm2, Equivalence::Equivalent),
            (
                &record.hints.icd11_biomedicine_code,
                &systems.biomedicine,
                Equivalence::RelatedTo,
            ),
        ];
        for (hint, target_system, equivalence) in hinted {
            let Some(target_code) = hint.as_deref().map(str::trim).filter(|c| !c.is_empty())
            else {
                continue;
            };
            drafts.push(MappingDraft {
                key: MappingKey {
                    source_system: systems.namaste.clone(),
                    source_code: record.code.code.clone(),
                    target_system: target_system.clone(),
                    target_code: target_code.to_string(),
                },
                equivalence,
                comment: Some("Generated from NAMASTE crosswalk".to_string()),
                confidence_score: confidence,
                mapping_version: None,
                origin: MappingOrigin::Generated,
            });
        }
    }
    drafts
}

#[derive(Clone)]
pub struct MappingGenerator {
    store: Arc<TerminologyStore>,
    mappings: MappingService,
    confidence: f64,
    audit: AuditService,
}

impl MappingGenerator {
    pub fn new(
        store: Arc<TerminologyStore>,
        mappings: MappingService,
        confidence: f64,
        audit: AuditService,
    ) -> Self {
        Self {
            store,
            mappings,
            confidence,
            audit,
        }
    }

    /// Create mappings for every hint whose `(source, targetSystem)` pair has none yet
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self) -> Result<GeneratedBatch> {
        let drafts = drafts_from_hints(&self.store.snapshot(), self.confidence);
        let hinted = drafts.len();
        let outcome = self.mappings.add_generated(drafts).await?;
        tracing::info!(
            hinted,
            created = outcome.created,
            already_mapped = outcome.already_mapped,
            skipped = outcome.skipped,
            "Mapping generation finished"
        );
        self.audit.data_load("mapping-generation", outcome.created);
        Ok(outcome)
    }
}
