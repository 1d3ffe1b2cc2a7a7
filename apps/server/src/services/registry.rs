//! Code Registry service: lookups and upserts with typed errors

use crate::db::TerminologyStore;
use crate::models::{
    Icd11Code, Icd11CodeType, NamasteCode, NewIcd11Code, NewNamasteCode, TerminologyStats,
    TraditionalSystem,
};
use crate::services::AuditService;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct CodeRegistryService {
    store: Arc<TerminologyStore>,
    audit: AuditService,
}

impl CodeRegistryService {
    pub fn new(store: Arc<TerminologyStore>, audit: AuditService) -> Self {
        Self { store, audit }
    }

    /// Look up a NAMASTE code, optionally requiring it to belong to `system`
    pub fn get_namaste(&self, system: Option<TraditionalSystem>, code: &str) -> Result<NamasteCode> {
        let snapshot = self.store.snapshot();
        let found = match system {
            Some(system) => snapshot.namaste_in(system, code),
            None => snapshot.namaste(code),
        };
        self.audit.code_lookup("NAMASTE", code);
        found.ok_or_else(|| match system {
            Some(system) => Error::NotFound(format!("NAMASTE code {code} in {system}")),
            None => Error::NotFound(format!("NAMASTE code {code}")),
        })
    }

    pub fn get_icd11(&self, code_type: Icd11CodeType, code: &str) -> Result<Icd11Code> {
        self.audit.code_lookup(code_type.as_str(), code);
        self.store
            .snapshot()
            .icd11(code_type, code)
            .ok_or_else(|| Error::NotFound(format!("ICD-11 {code_type} code {code}")))
    }

    pub fn list_namaste(&self, system: Option<TraditionalSystem>) -> Vec<NamasteCode> {
        self.store.snapshot().list_namaste(system)
    }

    pub fn list_icd11(&self, code_type: Option<Icd11CodeType>) -> Vec<Icd11Code> {
        self.store.snapshot().list_icd11(code_type)
    }

    pub fn categories(&self, system: Option<TraditionalSystem>) -> BTreeSet<String> {
        self.store.snapshot().categories(system)
    }

    pub fn chapters(&self, code_type: Option<Icd11CodeType>) -> BTreeSet<String> {
        self.store.snapshot().chapters(code_type)
    }

    pub fn stats(&self) -> TerminologyStats {
        self.store.snapshot().stats()
    }

    pub fn upsert_namaste(&self, input: NewNamasteCode) -> Result<NamasteCode> {
        self.store.upsert_namaste(input)
    }

    pub fn upsert_icd11(&self, input: NewIcd11Code) -> Result<Icd11Code> {
        self.store.upsert_icd11(input)
    }

    /// Load a batch of NAMASTE codes as one unit of work
    pub fn load_namaste(&self, source: &str, inputs: Vec<NewNamasteCode>) -> Result<usize> {
        let stored = self.store.bulk_upsert_namaste(inputs)?;
        self.audit.data_load(source, stored.len());
        Ok(stored.len())
    }

    pub fn load_icd11(&self, source: &str, inputs: Vec<NewIcd11Code>) -> Result<usize> {
        let stored = self.store.bulk_upsert_icd11(inputs)?;
        self.audit.data_load(source, stored.len());
        Ok(stored.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SystemUris;

    fn service() -> CodeRegistryService {
        let store = Arc::new(TerminologyStore::new(SystemUris::default(), "1.0", "1.0"));
        CodeRegistryService::new(store, AuditService::disabled())
    }

    #[test]
    fn lookups_report_not_found() {
        let registry = service();
        registry
            .upsert_namaste(NewNamasteCode::new(TraditionalSystem::Unani, "UN-1", "Humma"))
            .unwrap();

        assert!(registry.get_namaste(None, "UN-1").is_ok());
        assert!(matches!(
            registry.get_namaste(Some(TraditionalSystem::Siddha), "UN-1"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            registry.get_icd11(Icd11CodeType::Tm2, "SK00"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn stats_count_per_system_and_type() {
        let registry = service();
        registry
            .load_namaste(
                "test",
                vec![
                    NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY-1", "Jvara"),
                    NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY-2", "Kasa"),
                    NewNamasteCode::new(TraditionalSystem::Siddha, "SI-1", "Suram"),
                ],
            )
            .unwrap();
        registry
            .load_icd11(
                "test",
                vec![NewIcd11Code::new(Icd11CodeType::Biomedicine, "1A00", "Cholera")],
            )
            .unwrap();

        let stats = registry.stats();
        assert_eq!(stats.namaste_code_count, 3);
        assert_eq!(stats.ayurveda_count, 2);
        assert_eq!(stats.siddha_count, 1);
        assert_eq!(stats.unani_count, 0);
        assert_eq!(stats.biomedicine_count, 1);
        assert_eq!(stats.mapping_count, 0);
    }
}
