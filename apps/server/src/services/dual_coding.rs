//! Dual-Coding Workflow
//!
//! A Condition is created from a NAMASTE code: the code must exist, its TM2 and
//! biomedicine translations are attached as extra codings, and the result is
//! stored. Codings are captured at creation time and do not follow later
//! mapping edits.

use crate::db::{Snapshot, TerminologyStore};
use crate::models::{
    CreateConditionRequest, Icd11CodeType, NamasteCode, TranslationMatch, ValidateCodingRequest,
};
use crate::services::fhir::value_set::dual_coding_autocomplete;
use crate::services::fhir::FhirSettings;
use crate::services::{AuditService, SearchService, TranslationService};
use crate::{Error, Result};
use ayush_fhir_models::{
    Annotation, Bundle, BundleEntry, BundleType, CodeableConcept, Coding, Condition, Parameter,
    Parameters, Reference, Resource, ValueSet, CONDITION_CATEGORY_SYSTEM,
    CONDITION_CLINICAL_SYSTEM, CONDITION_VER_STATUS_SYSTEM,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use validator::Validate;

/// Where a created Condition is filed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionCategory {
    EncounterDiagnosis,
    ProblemListItem,
}

impl ConditionCategory {
    pub fn code(&self) -> &'static str {
        match self {
            ConditionCategory::EncounterDiagnosis => "encounter-diagnosis",
            ConditionCategory::ProblemListItem => "problem-list-item",
        }
    }

    fn display(&self) -> &'static str {
        match self {
            ConditionCategory::EncounterDiagnosis => "Encounter Diagnosis",
            ConditionCategory::ProblemListItem => "Problem List Item",
        }
    }
}

/// In-memory Condition storage with a per-patient index in creation order
#[derive(Debug, Default)]
pub struct ConditionStore {
    conditions: DashMap<String, Condition>,
    by_patient: DashMap<String, Vec<String>>,
}

impl ConditionStore {
    pub fn insert(&self, condition: Condition) {
        let Some(id) = condition.id.clone() else {
            return;
        };
        if let Some(patient) = condition.patient_id() {
            self.by_patient
                .entry(patient.to_string())
                .or_default()
                .push(id.clone());
        }
        self.conditions.insert(id, condition);
    }

    pub fn get(&self, id: &str) -> Option<Condition> {
        self.conditions.get(id).map(|c| c.clone())
    }

    pub fn for_patient(&self, patient_id: &str) -> Vec<Condition> {
        let Some(ids) = self.by_patient.get(patient_id).map(|ids| ids.clone()) else {
            return Vec::new();
        };
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

fn status(system: &str, code: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(system, code))
}

fn match_coding(m: &TranslationMatch) -> Coding {
    let coding = Coding::new(&m.target_system, &m.target_code);
    match &m.target_display {
        Some(display) => coding.with_display(display),
        None => coding,
    }
}

fn namaste_coding(snapshot: &Snapshot, code: &NamasteCode) -> Coding {
    Coding::new(&snapshot.systems().namaste, &code.code)
        .with_display(&code.display)
        .with_version(&code.version)
}

#[derive(Clone)]
pub struct DualCodingService {
    store: Arc<TerminologyStore>,
    translation: TranslationService,
    search: SearchService,
    settings: Arc<FhirSettings>,
    conditions: Arc<ConditionStore>,
    audit: AuditService,
}

impl DualCodingService {
    pub fn new(
        store: Arc<TerminologyStore>,
        translation: TranslationService,
        search: SearchService,
        settings: FhirSettings,
        audit: AuditService,
    ) -> Self {
        Self {
            store,
            translation,
            search,
            settings: Arc::new(settings),
            conditions: Arc::new(ConditionStore::default()),
            audit,
        }
    }

    /// NAMASTE coding followed by every TM2 and biomedicine translation
    fn dual_coding(&self, snapshot: &Snapshot, code: &NamasteCode) -> Result<CodeableConcept> {
        let mut concept = CodeableConcept::from_coding(namaste_coding(snapshot, code))
            .with_text(&code.display);
        let systems = snapshot.systems();
        for target in [&systems.tm2, &systems.biomedicine] {
            for m in self
                .translation
                .translate_in(snapshot, &systems.namaste, &code.code, target)?
            {
                let coding = match_coding(&m);
                if !concept.coding.contains(&coding) {
                    concept.coding.push(coding);
                }
            }
        }
        Ok(concept)
    }

    #[tracing::instrument(skip(self, request), fields(namaste_code = %request.namaste_code))]
    pub fn create_condition(
        &self,
        request: CreateConditionRequest,
        category: ConditionCategory,
    ) -> Result<Condition> {
        request.validate()?;
        let snapshot = self.store.snapshot();
        let code = request.namaste_code.trim();
        let namaste = snapshot
            .namaste(code)
            .ok_or_else(|| Error::NotFound(format!("NAMASTE code {code}")))?;

        let mut condition = Condition::new();
        condition.id = Some(uuid::Uuid::new_v4().to_string());
        condition.subject = Some(Reference::to(format!(
            "Patient/{}",
            request.patient_id.trim()
        )));
        condition.clinical_status = Some(status(
            CONDITION_CLINICAL_SYSTEM,
            request.clinical_status.as_deref().unwrap_or("active"),
        ));
        condition.verification_status = Some(status(
            CONDITION_VER_STATUS_SYSTEM,
            request.verification_status.as_deref().unwrap_or("confirmed"),
        ));
        condition.category = vec![CodeableConcept::from_coding(
            Coding::new(CONDITION_CATEGORY_SYSTEM, category.code()).with_display(category.display()),
        )];
        condition.code = Some(self.dual_coding(&snapshot, &namaste)?);
        condition.onset_date_time = request.onset_date.clone();
        condition.recorded_date = Some(self.settings.now());
        if let Some(notes) = request.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            condition.note.push(Annotation {
                author_string: None,
                time: None,
                text: notes.to_string(),
            });
        }

        let codings = condition.code.as_ref().map_or(0, |c| c.coding.len());
        let id = condition.id.clone().unwrap_or_default();
        self.audit
            .condition_created(&id, request.patient_id.trim(), codings);
        tracing::info!(condition_id = %id, codings, "Created dual-coded Condition");

        self.conditions.insert(condition.clone());
        Ok(condition)
    }

    pub fn get_condition(&self, id: &str) -> Result<Condition> {
        self.conditions
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("Condition/{id}")))
    }

    /// Stored Conditions of a patient as a searchset
    pub fn conditions_for_patient(&self, patient_id: &str) -> Result<Bundle> {
        let conditions = self.conditions.for_patient(patient_id.trim());
        let mut bundle = Bundle::new(BundleType::Searchset);
        bundle.id = Some(uuid::Uuid::new_v4().to_string());
        bundle.timestamp = Some(self.settings.now());
        bundle.total = Some(conditions.len() as u32);
        for condition in conditions {
            let full_url = condition
                .id
                .as_deref()
                .map(|id| self.settings.url(&format!("Condition/{id}")));
            bundle.add_entry(BundleEntry::resource(full_url, condition.to_value()?));
        }
        Ok(bundle)
    }

    /// Conditions carrying exactly one known NAMASTE coding are dual coded;
    /// every other entry passes through unchanged.
    pub fn process_bundle(&self, bundle: Bundle) -> Result<Bundle> {
        let snapshot = self.store.snapshot();
        let mut processed = Bundle::new(BundleType::Collection);
        processed.id = Some(format!(
            "processed-{}",
            bundle
                .id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
        ));
        processed.timestamp = Some(self.settings.now());

        let mut dual_coded = 0usize;
        for entry in bundle.entry {
            if entry.resource_type() != Some("Condition") {
                processed.add_entry(entry);
                continue;
            }
            let Some(resource) = entry.resource.as_ref() else {
                processed.add_entry(entry);
                continue;
            };
            let mut condition = Condition::from_value(resource)?;
            let single = condition
                .code
                .as_ref()
                .filter(|c| c.coding.len() == 1)
                .and_then(|c| c.codings_from(&snapshot.systems().namaste).next())
                .and_then(|c| c.code.as_deref())
                .and_then(|code| snapshot.namaste(code));

            match single {
                Some(namaste) => {
                    let mut code = self.dual_coding(&snapshot, &namaste)?;
                    if let Some(text) = condition.code.as_ref().and_then(|c| c.text.clone()) {
                        code.text = Some(text);
                    }
                    condition.code = Some(code);
                    dual_coded += 1;
                    processed.add_entry(BundleEntry {
                        full_url: entry.full_url,
                        resource: Some(condition.to_value()?),
                        extensions: entry.extensions,
                    });
                }
                None => processed.add_entry(entry),
            }
        }

        tracing::info!(
            entries = processed.entry_count(),
            dual_coded,
            "Processed dual-coding bundle"
        );
        Ok(processed)
    }

    /// Translations of a NAMASTE code into TM2 and biomedicine
    pub fn coding_suggestions(&self, namaste_code: &str) -> Result<Parameters> {
        let snapshot = self.store.snapshot();
        let code = namaste_code.trim();
        let namaste = snapshot
            .namaste(code)
            .ok_or_else(|| Error::NotFound(format!("NAMASTE code {code}")))?;
        let systems = snapshot.systems();

        let mut params = Parameters::new();
        params.add_value_coding("namaste", &namaste_coding(&snapshot, &namaste));
        for (name, target) in [("tm2", &systems.tm2), ("biomedicine", &systems.biomedicine)] {
            for m in self
                .translation
                .translate_in(&snapshot, &systems.namaste, code, target)?
            {
                params.add_parts(
                    name,
                    vec![
                        Parameter::coding("concept", &match_coding(&m)),
                        Parameter::code("equivalence", m.equivalence.fhir_code()),
                        Parameter::value(
                            "confidence",
                            "valueDecimal",
                            serde_json::json!(m.confidence_score),
                        ),
                    ],
                );
            }
        }
        Ok(params)
    }

    /// Both codes must exist and a usable mapping must link them
    pub fn validate_coding(&self, request: ValidateCodingRequest) -> Result<Parameters> {
        request.validate()?;
        let snapshot = self.store.snapshot();
        let systems = snapshot.systems();
        let namaste_code = request.namaste_code.trim();
        let icd11_code = request.icd11_code.trim();
        let code_type = match request.system.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("TM2") => Icd11CodeType::Tm2,
            _ => Icd11CodeType::Biomedicine,
        };
        let target_system = systems.icd11_uri(code_type);

        let mut errors = Vec::new();
        let namaste = snapshot.namaste(namaste_code);
        if namaste.is_none() {
            errors.push(format!("NAMASTE code not found: {namaste_code}"));
        }
        let icd11 = Icd11CodeType::ALL
            .iter()
            .find_map(|t| snapshot.icd11(*t, icd11_code));
        if icd11.is_none() {
            errors.push(format!("ICD-11 code not found: {icd11_code}"));
        }

        let mapping = if namaste.is_some() && icd11.is_some() {
            let found = TranslationService::direct_match(
                &snapshot,
                &systems.namaste,
                namaste_code,
                target_system,
                icd11_code,
            );
            if found.is_none() {
                errors.push(format!(
                    "No mapping found between NAMASTE code {namaste_code} and ICD-11 code {icd11_code}"
                ));
            }
            found
        } else {
            None
        };

        let mut params = Parameters::new();
        params.add_value_boolean("valid", errors.is_empty());
        for error in errors {
            params.add_value_string("error", error);
        }
        if let Some(m) = mapping {
            params.add_parts(
                "mapping",
                vec![
                    Parameter::string("id", m.id.map(|id| id.to_string()).unwrap_or_default()),
                    Parameter::code("equivalence", m.equivalence.fhir_code()),
                    Parameter::value(
                        "confidence",
                        "valueDecimal",
                        serde_json::json!(m.confidence_score),
                    ),
                ],
            );
        }
        Ok(params)
    }

    /// NAMASTE and ICD-11 autocomplete suggestions as one ValueSet expansion
    pub fn autocomplete(&self, term: &str, limit: Option<usize>) -> ValueSet {
        let namaste = self.search.autocomplete_namaste(term, limit);
        let icd11 = self.search.autocomplete_icd11(term, None, limit);
        let snapshot = self.store.snapshot();
        dual_coding_autocomplete(snapshot.systems(), &self.settings, &namaste, &icd11)
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }
}
