//! Code Registry state: canonical NAMASTE and ICD-11 records keyed by natural key

use crate::models::{
    CrosswalkHints, Icd11Code, Icd11CodeType, NamasteCode, NewIcd11Code, NewNamasteCode,
    TraditionalSystem,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

lazy_static! {
    static ref CODE_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-/()]{0,63}$").expect("valid code pattern");
}

/// Reject codes outside `^[A-Za-z0-9][A-Za-z0-9._\-/()]{0,63}$`
pub fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(Error::Validation("code is required".to_string()));
    }
    if !CODE_PATTERN.is_match(code) {
        return Err(Error::Validation(format!(
            "code '{code}' does not match the allowed pattern"
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Stored NAMASTE record. Hints feed mapping generation and are never returned to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct NamasteRecord {
    pub code: NamasteCode,
    pub hints: CrosswalkHints,
}

#[derive(Debug, Clone, Default)]
pub struct RegistryState {
    /// NAMASTE codes are unique across all traditional systems
    namaste: BTreeMap<String, Arc<NamasteRecord>>,
    icd11: BTreeMap<(Icd11CodeType, String), Arc<Icd11Code>>,
    next_id: i64,
}

impl RegistryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn namaste(&self, code: &str) -> Option<&Arc<NamasteRecord>> {
        self.namaste.get(code)
    }

    pub fn icd11(&self, code_type: Icd11CodeType, code: &str) -> Option<&Arc<Icd11Code>> {
        self.icd11.get(&(code_type, code.to_string()))
    }

    /// NAMASTE records in code order, optionally narrowed to one system
    pub fn list_namaste(
        &self,
        system: Option<TraditionalSystem>,
    ) -> impl Iterator<Item = &Arc<NamasteRecord>> + '_ {
        self.namaste
            .values()
            .filter(move |r| system.map_or(true, |s| r.code.system == s))
    }

    /// ICD-11 records ordered by code type then code
    pub fn list_icd11(
        &self,
        code_type: Option<Icd11CodeType>,
    ) -> impl Iterator<Item = &Arc<Icd11Code>> + '_ {
        self.icd11
            .values()
            .filter(move |c| code_type.map_or(true, |t| c.code_type == t))
    }

    pub fn categories(&self, system: Option<TraditionalSystem>) -> BTreeSet<String> {
        self.list_namaste(system)
            .filter_map(|r| r.code.category.clone())
            .collect()
    }

    pub fn chapters(&self, code_type: Option<Icd11CodeType>) -> BTreeSet<String> {
        self.list_icd11(code_type)
            .filter_map(|c| c.chapter.clone())
            .collect()
    }

    pub fn namaste_count(&self) -> usize {
        self.namaste.len()
    }

    pub fn icd11_count(&self) -> usize {
        self.icd11.len()
    }

    pub fn count_system(&self, system: TraditionalSystem) -> usize {
        self.list_namaste(Some(system)).count()
    }

    pub fn count_code_type(&self, code_type: Icd11CodeType) -> usize {
        self.list_icd11(Some(code_type)).count()
    }

    /// Insert or replace a NAMASTE code by its natural key
    pub fn upsert_namaste(
        &mut self,
        input: NewNamasteCode,
        default_version: &str,
        now: DateTime<Utc>,
    ) -> Result<NamasteCode> {
        let code = input.code.trim().to_string();
        validate_code(&code)?;
        let display = input.display.trim().to_string();
        if display.is_empty() {
            return Err(Error::Validation(format!("display is required for {code}")));
        }

        let existing = self.namaste.get(&code).cloned();
        let system = match (input.system, existing.as_deref()) {
            (Some(requested), Some(current)) if requested != current.code.system => {
                return Err(Error::Conflict(format!(
                    "NAMASTE code {code} is already registered under {}",
                    current.code.system
                )));
            }
            (Some(requested), _) => requested,
            (None, Some(current)) => current.code.system,
            (None, None) => {
                return Err(Error::Validation(format!("system is required for {code}")));
            }
        };

        let version = non_blank(input.version)
            .or_else(|| existing.as_ref().map(|r| r.code.version.clone()))
            .unwrap_or_else(|| default_version.to_string());

        let (id, created_at) = match existing.as_deref() {
            Some(current) => (current.code.id, current.code.created_at),
            None => (self.allocate_id(), now),
        };

        let record = NamasteRecord {
            code: NamasteCode {
                id,
                code: code.clone(),
                display,
                definition: non_blank(input.definition),
                system,
                category: non_blank(input.category),
                subcategory: non_blank(input.subcategory),
                who_terminology_code: non_blank(input.who_terminology_code),
                icd11_tm2_code: None,
                icd11_biomedicine_code: None,
                version,
                created_at,
                updated_at: now,
            },
            hints: CrosswalkHints {
                icd11_tm2_code: non_blank(input.hints.icd11_tm2_code),
                icd11_biomedicine_code: non_blank(input.hints.icd11_biomedicine_code),
            },
        };

        let stored = record.code.clone();
        self.namaste.insert(code, Arc::new(record));
        Ok(stored)
    }

    /// Insert or replace an ICD-11 code without checking its parent.
    /// Callers run [`RegistryState::check_parent`] once the unit of work is complete.
    pub fn insert_icd11(&mut self, input: NewIcd11Code, now: DateTime<Utc>) -> Result<Icd11Code> {
        let code = input.code.trim().to_string();
        validate_code(&code)?;
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation(format!("title is required for {code}")));
        }
        let parent = non_blank(input.parent);
        if parent.as_deref() == Some(code.as_str()) {
            return Err(Error::Validation(format!("{code} cannot be its own parent")));
        }

        let key = (input.code_type, code.clone());
        let (id, created_at) = match self.icd11.get(&key) {
            Some(current) => (current.id, current.created_at),
            None => (self.allocate_id(), now),
        };

        let synonyms = input
            .synonyms
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();

        let stored = Icd11Code {
            id,
            code,
            title,
            definition: non_blank(input.definition),
            code_type: input.code_type,
            parent,
            chapter: non_blank(input.chapter),
            synonyms,
            foundation_uri: non_blank(input.foundation_uri),
            linearization_uri: non_blank(input.linearization_uri),
            created_at,
            updated_at: now,
        };

        self.icd11.insert(key, Arc::new(stored.clone()));
        Ok(stored)
    }

    /// The parent of an ICD-11 code must exist in the same code type and must not lead back to it
    pub fn check_parent(&self, code_type: Icd11CodeType, code: &str) -> Result<()> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(code);

        let mut current = self.icd11(code_type, code).and_then(|c| c.parent.as_deref());
        while let Some(parent) = current {
            if !visited.insert(parent) {
                return Err(Error::Validation(format!(
                    "parent chain of {code_type} {code} contains a cycle at {parent}"
                )));
            }
            let Some(record) = self.icd11(code_type, parent) else {
                return Err(Error::Validation(format!(
                    "parent {parent} of {code_type} {code} is not registered"
                )));
            };
            current = record.parent.as_deref();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn code_pattern_accepts_namaste_and_icd_shapes() {
        for code in ["AAE-16", "SK00", "1A00.0", "SR11(AAA)", "a/b_c"] {
            assert!(validate_code(code).is_ok(), "{code}");
        }
        for code in ["", "-AAE", "has space", &"X".repeat(65)] {
            assert!(validate_code(code).is_err(), "{code}");
        }
    }

    #[test]
    fn upsert_keeps_id_and_created_at() {
        let mut state = RegistryState::default();
        let first = state
            .upsert_namaste(
                NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY001", "Jvara"),
                "1.0",
                now(),
            )
            .unwrap();

        let mut update = NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY001", "Jvara (fever)");
        update.category = Some("  ".to_string());
        let second = state.upsert_namaste(update, "1.0", now()).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.display, "Jvara (fever)");
        assert_eq!(second.category, None);
        assert_eq!(state.namaste_count(), 1);
    }

    #[test]
    fn same_code_under_another_system_conflicts() {
        let mut state = RegistryState::default();
        state
            .upsert_namaste(
                NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY001", "Jvara"),
                "1.0",
                now(),
            )
            .unwrap();
        let err = state
            .upsert_namaste(
                NewNamasteCode::new(TraditionalSystem::Siddha, "AY001", "Suram"),
                "1.0",
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn missing_display_is_rejected() {
        let mut state = RegistryState::default();
        let err = state
            .upsert_namaste(
                NewNamasteCode::new(TraditionalSystem::Unani, "UN001", " "),
                "1.0",
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn parent_must_exist_and_not_cycle() {
        let mut state = RegistryState::default();
        let mut child = NewIcd11Code::new(Icd11CodeType::Tm2, "SK01", "Child");
        child.parent = Some("SK00".to_string());
        state.insert_icd11(child, now()).unwrap();
        assert!(state.check_parent(Icd11CodeType::Tm2, "SK01").is_err());

        state
            .insert_icd11(NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Parent"), now())
            .unwrap();
        assert!(state.check_parent(Icd11CodeType::Tm2, "SK01").is_ok());

        // Parent in another code type does not count
        let mut bio = NewIcd11Code::new(Icd11CodeType::Biomedicine, "1A00", "Bio");
        bio.parent = Some("SK00".to_string());
        state.insert_icd11(bio, now()).unwrap();
        assert!(state.check_parent(Icd11CodeType::Biomedicine, "1A00").is_err());

        let mut looped = NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Parent");
        looped.parent = Some("SK01".to_string());
        state.insert_icd11(looped, now()).unwrap();
        assert!(state.check_parent(Icd11CodeType::Tm2, "SK00").is_err());
    }

    #[test]
    fn categories_are_per_system() {
        let mut state = RegistryState::default();
        let mut a = NewNamasteCode::new(TraditionalSystem::Ayurveda, "AY001", "Jvara");
        a.category = Some("Fever".to_string());
        let mut s = NewNamasteCode::new(TraditionalSystem::Siddha, "SI001", "Suram");
        s.category = Some("Heat".to_string());
        state.upsert_namaste(a, "1.0", now()).unwrap();
        state.upsert_namaste(s, "1.0", now()).unwrap();

        let ayurveda = state.categories(Some(TraditionalSystem::Ayurveda));
        assert_eq!(ayurveda.into_iter().collect::<Vec<_>>(), vec!["Fever"]);
        assert_eq!(state.categories(None).len(), 2);
    }
}
