//! FHIR Resource Builder
//!
//! Renders the registry and graph as FHIR terminology resources and answers the
//! terminology operations. Whole-registry resources are cached per snapshot
//! generation.

pub mod capability;
pub mod code_system;
pub mod concept_map;
pub mod operations;
pub mod value_set;

pub use value_set::ValueSetFilterParams;

use crate::config::Config;
use crate::db::TerminologyStore;
use crate::services::{GenerationCache, TranslationService};
use crate::Result;
use ayush_fhir_models::{CapabilityStatement, Parameters, Resource, ValueSet};
use serde_json::Value;
use std::sync::Arc;

/// Publication metadata shared by every rendered resource
#[derive(Debug, Clone)]
pub struct FhirSettings {
    /// Public FHIR base, no trailing slash
    pub base_url: String,
    pub namaste_version: String,
    pub mapping_version: String,
    pub publisher: String,
    pub software_version: String,
}

impl FhirSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.server.base_url.trim_end_matches('/').to_string(),
            namaste_version: config.terminology.namaste_version.clone(),
            mapping_version: config.terminology.mapping_version.clone(),
            publisher: config.terminology.publisher.clone(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn now(&self) -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

impl Default for FhirSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Clone)]
pub struct FhirService {
    store: Arc<TerminologyStore>,
    translation: TranslationService,
    settings: Arc<FhirSettings>,
    rendered: Arc<GenerationCache<&'static str, Value>>,
}

impl FhirService {
    pub fn new(
        store: Arc<TerminologyStore>,
        translation: TranslationService,
        settings: FhirSettings,
    ) -> Self {
        Self {
            store,
            translation,
            settings: Arc::new(settings),
            rendered: Arc::new(GenerationCache::new(4)),
        }
    }

    pub fn settings(&self) -> &FhirSettings {
        &self.settings
    }

    /// CodeSystem `namaste-codes` as JSON
    pub fn code_system(&self) -> Result<Arc<Value>> {
        let snapshot = self.store.snapshot();
        self.rendered
            .get_or_try_insert(snapshot.generation(), "CodeSystem", || {
                Ok(code_system::namaste_code_system(&snapshot, &self.settings).to_value()?)
            })
    }

    /// ConceptMap `namaste-to-icd11` as JSON
    pub fn concept_map(&self) -> Result<Arc<Value>> {
        let snapshot = self.store.snapshot();
        self.rendered
            .get_or_try_insert(snapshot.generation(), "ConceptMap", || {
                Ok(concept_map::namaste_to_icd11(&snapshot, &self.settings).to_value()?)
            })
    }

    pub fn value_set(&self, params: &ValueSetFilterParams) -> ValueSet {
        value_set::namaste_value_set(&self.store.snapshot(), &self.settings, params, None, 0)
    }

    /// `$expand` with paging over the narrowed expansion
    pub fn expand(
        &self,
        params: &ValueSetFilterParams,
        count: Option<usize>,
        offset: Option<usize>,
    ) -> ValueSet {
        value_set::namaste_value_set(
            &self.store.snapshot(),
            &self.settings,
            params,
            count,
            offset.unwrap_or(0),
        )
    }

    pub fn capability_statement(&self) -> CapabilityStatement {
        capability::capability_statement(&self.settings)
    }

    /// `$translate`. Without `targetsystem` every other vocabulary is tried,
    /// which for a NAMASTE source means both ICD-11 code types.
    pub fn translate(
        &self,
        code: Option<&str>,
        system: Option<&str>,
        target_system: Option<&str>,
    ) -> Result<Parameters> {
        let snapshot = self.store.snapshot();
        let (_, source) = operations::resolve_system(&snapshot, system)?;
        let code = operations::required_code(code)?;
        let concept_map_url = self.settings.url("ConceptMap/namaste-to-icd11");

        if snapshot.resolve(&source, code).is_none() {
            return Ok(operations::translate_unknown_code(code, &source));
        }

        let matches = match target_system.map(str::trim).filter(|t| !t.is_empty()) {
            Some(target) => {
                let (_, target) = operations::resolve_system(&snapshot, Some(target))?;
                self.translation.translate(&source, code, &target)?
            }
            None => self.translation.translate_all(&source, code)?,
        };
        Ok(operations::translate_parameters(
            &concept_map_url,
            code,
            &source,
            &matches,
        ))
    }

    pub fn lookup(&self, system: Option<&str>, code: Option<&str>) -> Result<Parameters> {
        operations::lookup(&self.store.snapshot(), &self.settings, system, code)
    }

    pub fn validate_code(
        &self,
        system: Option<&str>,
        code: Option<&str>,
        display: Option<&str>,
    ) -> Result<Parameters> {
        operations::validate_code(&self.store.snapshot(), system, code, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SystemUris;
    use crate::models::{
        Equivalence, Icd11CodeType, MappingDraft, MappingKey, MappingOrigin, NewIcd11Code,
        NewNamasteCode, TraditionalSystem,
    };
    use crate::services::AuditService;
    use crate::Error;
    use ayush_fhir_models::ConceptMap;

    fn draft(s: (&str, &str), t: (&str, &str), equivalence: Equivalence) -> MappingDraft {
        MappingDraft {
            key: MappingKey {
                source_system: s.0.to_string(),
                source_code: s.1.to_string(),
                target_system: t.0.to_string(),
                target_code: t.1.to_string(),
            },
            equivalence,
            comment: None,
            confidence_score: 1.0,
            mapping_version: None,
            origin: MappingOrigin::Manual,
        }
    }

    async fn fixture() -> (FhirService, SystemUris) {
        let systems = SystemUris::default();
        let store = Arc::new(TerminologyStore::new(systems.clone(), "1.0", "1.0"));
        store
            .bulk_upsert_namaste(vec![
                NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY001", "Jvara"),
                NewNamasteCode::new(TraditionalSystem::Siddha, "SI001", "Suram"),
            ])
            .unwrap();
        store
            .bulk_upsert_icd11(vec![
                NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Fever disorder (TM2)"),
                NewIcd11Code::new(Icd11CodeType::Tm2, "SK01", "Heat disorder (TM2)"),
                NewIcd11Code::new(Icd11CodeType::Biomedicine, "MG26", "Fever"),
            ])
            .unwrap();
        for d in [
            draft((&systems.namaste, "AY001"), (&systems.tm2, "SK00"), Equivalence::Equivalent),
            draft((&systems.namaste, "AY001"), (&systems.biomedicine, "MG26"), Equivalence::RelatedTo),
            draft((&systems.namaste, "SI001"), (&systems.tm2, "SK01"), Equivalence::Wider),
            draft((&systems.namaste, "SI001"), (&systems.biomedicine, "MG26"), Equivalence::Unmatched),
        ] {
            store.add_or_update_mapping(d).await.unwrap();
        }
        let translation = TranslationService::new(store.clone(), None, 8, AuditService::disabled());
        (
            FhirService::new(store, translation, FhirSettings::default()),
            systems,
        )
    }

    #[tokio::test]
    async fn concept_map_groups_by_system_pair() {
        let (fhir, _) = fixture().await;
        let cm = ConceptMap::from_value(&fhir.concept_map().unwrap()).unwrap();
        assert_eq!(cm.group.len(), 2);
        let tm2 = cm
            .group
            .iter()
            .find(|g| g.target.as_deref() == Some(SystemUris::default().tm2.as_str()))
            .unwrap();
        assert_eq!(tm2.element.len(), 2);
        assert_eq!(tm2.element[0].target[0].equivalence, "equivalent");
    }

    #[tokio::test]
    async fn translate_reports_matches_and_unknown_codes() {
        let (fhir, systems) = fixture().await;
        let found = fhir
            .translate(Some("AY001"), None, Some(&systems.tm2))
            .unwrap();
        assert_eq!(found.get_bool("result"), Some(true));
        assert_eq!(found.get_all("match").count(), 1);

        let both = fhir.translate(Some("AY001"), None, None).unwrap();
        assert_eq!(both.get_all("match").count(), 2);

        let unknown = fhir.translate(Some("NOPE"), None, None).unwrap();
        assert_eq!(unknown.get_bool("result"), Some(false));
        assert!(unknown.get_str("message").is_some());

        let bad_system = fhir.translate(Some("AY001"), Some("urn:other"), None);
        assert!(matches!(bad_system, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn lookup_and_validate_code() {
        let (fhir, systems) = fixture().await;
        let lookup = fhir.lookup(None, Some("AY001")).unwrap();
        assert_eq!(lookup.get_str("display"), Some("Jvara"));
        assert!(matches!(
            fhir.lookup(Some(&systems.tm2), Some("XX99")),
            Err(Error::NotFound(_))
        ));

        let ok = fhir.validate_code(None, Some("AY001"), Some("jvara")).unwrap();
        assert_eq!(ok.get_bool("result"), Some(true));
        let unknown = fhir.validate_code(None, Some("AY999"), None).unwrap();
        assert_eq!(unknown.get_bool("result"), Some(false));
    }

    #[tokio::test]
    async fn expand_filters_and_pages() {
        let (fhir, _) = fixture().await;
        let params = ValueSetFilterParams {
            filter: Some("SUR".to_string()),
            system: None,
        };
        let vs = fhir.expand(&params, None, None);
        let expansion = vs.expansion.unwrap();
        assert_eq!(expansion.total, Some(1));
        assert_eq!(expansion.contains[0].code.as_deref(), Some("SI001"));

        let paged = fhir.expand(&ValueSetFilterParams::default(), Some(1), Some(1));
        let expansion = paged.expansion.unwrap();
        assert_eq!(expansion.total, Some(2));
        assert_eq!(expansion.contains.len(), 1);
    }
}
