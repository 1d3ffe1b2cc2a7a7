//! Mapping Graph service: the only writer of mappings

use crate::db::{GeneratedBatch, MappingWrite, TerminologyStore};
use crate::metrics::MAPPING_WRITES_TOTAL;
use crate::models::{ConceptMapping, CreateMappingRequest, MappingDraft, MappingOrigin};
use crate::services::AuditService;
use crate::{Error, Result};
use std::sync::Arc;
use validator::Validate;

#[derive(Clone)]
pub struct MappingService {
    store: Arc<TerminologyStore>,
    audit: AuditService,
}

impl MappingService {
    pub fn new(store: Arc<TerminologyStore>, audit: AuditService) -> Self {
        Self { store, audit }
    }

    /// Validate a request body and create or update the mapping for its key
    pub async fn create(&self, request: CreateMappingRequest) -> Result<MappingWrite> {
        request.validate()?;
        self.add_or_update(request.into_draft()).await
    }

    #[tracing::instrument(skip(self, draft), fields(key = %draft.key))]
    pub async fn add_or_update(&self, draft: MappingDraft) -> Result<MappingWrite> {
        let write = self.store.add_or_update_mapping(draft).await?;
        let action = if write.created { "created" } else { "updated" };
        MAPPING_WRITES_TOTAL
            .with_label_values(&[action, write.mapping.origin.as_str()])
            .inc();
        self.audit.mapping_written(&write.mapping, write.created);
        tracing::debug!(mapping_id = write.mapping.id, action, "Mapping stored");
        Ok(write)
    }

    pub async fn remove(&self, id: i64) -> Result<ConceptMapping> {
        let removed = self.store.remove_mapping(id).await?;
        MAPPING_WRITES_TOTAL
            .with_label_values(&["deleted", removed.origin.as_str()])
            .inc();
        self.audit.mapping_deleted(&removed);
        Ok(removed)
    }

    /// Apply machine-generated drafts; existing links are left untouched
    pub async fn add_generated(&self, drafts: Vec<MappingDraft>) -> Result<GeneratedBatch> {
        if drafts.iter().any(|d| d.origin != MappingOrigin::Generated) {
            return Err(Error::Internal(
                "generated batch contains a manual mapping".to_string(),
            ));
        }
        let outcome = self.store.add_generated_mappings(drafts).await?;
        MAPPING_WRITES_TOTAL
            .with_label_values(&["created", MappingOrigin::Generated.as_str()])
            .inc_by(outcome.created as u64);
        Ok(outcome)
    }

    pub fn get(&self, id: i64) -> Result<ConceptMapping> {
        self.store
            .snapshot()
            .mapping(id)
            .ok_or_else(|| Error::NotFound(format!("ConceptMapping {id}")))
    }

    /// All mappings in id order, optionally narrowed to one source code
    pub fn list(&self, source_code: Option<&str>) -> Vec<ConceptMapping> {
        let snapshot = self.store.snapshot();
        snapshot
            .mappings()
            .filter(|m| source_code.map_or(true, |code| m.source_code == code))
            .map(|m| (**m).clone())
            .collect()
    }

    /// Edges leaving a source code in edge order
    pub fn by_source(&self, source_system: &str, source_code: &str) -> Vec<ConceptMapping> {
        self.store
            .snapshot()
            .edges_from(source_system, source_code)
            .iter()
            .map(|m| (**m).clone())
            .collect()
    }

    /// Edges pointing at a target code, served from the reverse index
    pub fn by_target(&self, target_system: &str, target_code: &str) -> Vec<ConceptMapping> {
        self.store
            .snapshot()
            .edges_to(target_system, target_code)
            .iter()
            .map(|m| (**m).clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.store.snapshot().mapping_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SystemUris;
    use crate::models::{Equivalence, Icd11CodeType, NewIcd11Code, NewNamasteCode, TraditionalSystem};

    fn setup() -> (MappingService, SystemUris) {
        let systems = SystemUris::default();
        let store = Arc::new(TerminologyStore::new(systems.clone(), "1.0", "1.0"));
        store
            .upsert_namaste(NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY001", "Jvara"))
            .unwrap();
        store
            .upsert_icd11(NewIcd11Code::new(Icd11CodeType::Tm2, "ABC", "Fever (TM2)"))
            .unwrap();
        (MappingService::new(store, AuditService::disabled()), systems)
    }

    fn request(systems: &SystemUris) -> CreateMappingRequest {
        CreateMappingRequest {
            source_code: "AY001".into(),
            source_system: systems.namaste.clone(),
            target_code: "ABC".into(),
            target_system: systems.tm2.clone(),
            equivalence: Equivalence::Equivalent,
            comment: None,
            confidence_score: Some(0.95),
            mapping_version: None,
        }
    }

    #[tokio::test]
    async fn resubmitting_keeps_id_and_count() {
        let (service, systems) = setup();
        let first = service.create(request(&systems)).await.unwrap();
        let second = service.create(request(&systems)).await.unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.mapping.id, second.mapping.id);
        assert_eq!(service.count(), 1);
    }

    #[tokio::test]
    async fn edges_are_visible_from_both_ends_until_removed() {
        let (service, systems) = setup();
        let write = service.create(request(&systems)).await.unwrap();
        assert_eq!(service.by_source(&systems.namaste, "AY001").len(), 1);
        assert_eq!(service.by_target(&systems.tm2, "ABC")[0].id, write.mapping.id);

        service.remove(write.mapping.id).await.unwrap();
        assert!(service.by_source(&systems.namaste, "AY001").is_empty());
        assert!(service.by_target(&systems.tm2, "ABC").is_empty());
    }

    #[tokio::test]
    async fn blank_source_code_is_a_validation_error() {
        let (service, systems) = setup();
        let mut bad = request(&systems);
        bad.source_code = String::new();
        assert!(matches!(service.create(bad).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn remove_unknown_id_is_not_found() {
        let (service, _) = setup();
        assert!(matches!(service.remove(99).await, Err(Error::NotFound(_))));
        assert!(matches!(service.get(99), Err(Error::NotFound(_))));
    }
}
