use super::FhirSettings;
use crate::db::{Snapshot, SystemUris};
use crate::models::{Icd11Code, NamasteCode, TraditionalSystem};
use ayush_fhir_models::{
    Coding, PublicationStatus, ValueSet, ValueSetCompose, ValueSetDesignation,
    ValueSetExpansion, ValueSetExpansionContains, ValueSetFilter, ValueSetInclude,
};

pub const VALUE_SET_ID: &str = "namaste";
pub const DUAL_CODING_VALUE_SET_ID: &str = "dual-coding-autocomplete";
const DESIGNATION_USAGE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/designation-usage";

/// Narrowing applied to the NAMASTE value set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSetFilterParams {
    /// Case-insensitive display substring
    pub filter: Option<String>,
    pub system: Option<TraditionalSystem>,
}

impl ValueSetFilterParams {
    fn text(&self) -> Option<String> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase)
    }

    fn matches(&self, code: &NamasteCode) -> bool {
        let text_ok = self
            .text()
            .map_or(true, |f| code.display.to_lowercase().contains(&f));
        text_ok && self.system.map_or(true, |s| code.system == s)
    }
}

fn base(settings: &FhirSettings) -> ValueSet {
    let mut vs = ValueSet::new(PublicationStatus::Active);
    vs.id = Some(VALUE_SET_ID.to_string());
    vs.url = Some(settings.url("ValueSet/namaste"));
    vs.version = Some(settings.namaste_version.clone());
    vs.name = Some("NAMASTEValueSet".to_string());
    vs.title = Some("NAMASTE Value Set".to_string());
    vs.date = Some(settings.now());
    vs.publisher = Some(settings.publisher.clone());
    vs
}

fn compose(systems: &SystemUris, params: &ValueSetFilterParams) -> ValueSetCompose {
    let mut include = ValueSetInclude {
        system: Some(systems.namaste.clone()),
        version: None,
        concept: Vec::new(),
        filter: Vec::new(),
    };
    if let Some(text) = params.filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        include.filter.push(ValueSetFilter {
            property: "display".to_string(),
            op: "regex".to_string(),
            value: format!(".*{}.*", regex::escape(text)),
        });
    }
    if let Some(system) = params.system {
        include.filter.push(ValueSetFilter {
            property: "system".to_string(),
            op: "=".to_string(),
            value: system.as_str().to_string(),
        });
    }
    ValueSetCompose {
        include: vec![include],
    }
}

fn contains(system: &str, code: &NamasteCode) -> ValueSetExpansionContains {
    ValueSetExpansionContains {
        system: Some(system.to_string()),
        version: Some(code.version.clone()),
        code: Some(code.code.clone()),
        display: Some(code.display.clone()),
        designation: Vec::new(),
    }
}

/// NAMASTE value set with compose and an expansion narrowed the same way.
/// `count` and `offset` page the expansion; `total` always counts every match.
pub fn namaste_value_set(
    snapshot: &Snapshot,
    settings: &FhirSettings,
    params: &ValueSetFilterParams,
    count: Option<usize>,
    offset: usize,
) -> ValueSet {
    let systems = snapshot.systems();
    let matching: Vec<NamasteCode> = snapshot
        .list_namaste(params.system)
        .into_iter()
        .filter(|c| params.matches(c))
        .collect();
    let total = matching.len();

    let mut vs = base(settings);
    vs.compose = Some(compose(systems, params));
    vs.expansion = Some(ValueSetExpansion {
        identifier: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
        timestamp: settings.now(),
        total: Some(total as u32),
        offset: Some(offset as u32),
        contains: matching
            .iter()
            .skip(offset)
            .take(count.unwrap_or(usize::MAX))
            .map(|c| contains(&systems.namaste, c))
            .collect(),
    });
    vs
}

/// Expansion mixing NAMASTE and ICD-11 suggestions, NAMASTE first
pub fn dual_coding_autocomplete(
    systems: &SystemUris,
    settings: &FhirSettings,
    namaste: &[NamasteCode],
    icd11: &[Icd11Code],
) -> ValueSet {
    let preferred = Coding::new(DESIGNATION_USAGE_SYSTEM, "preferred");

    let mut items: Vec<ValueSetExpansionContains> = namaste
        .iter()
        .map(|c| {
            let mut entry = contains(&systems.namaste, c);
            entry.designation.push(ValueSetDesignation {
                language: None,
                designation_use: Some(preferred.clone()),
                value: format!("NAMASTE: {}", c.display),
            });
            entry
        })
        .collect();
    items.extend(icd11.iter().map(|c| ValueSetExpansionContains {
        system: Some(systems.icd11_uri(c.code_type).to_string()),
        version: None,
        code: Some(c.code.clone()),
        display: Some(c.title.clone()),
        designation: vec![ValueSetDesignation {
            language: None,
            designation_use: Some(preferred.clone()),
            value: format!("ICD-11 {}: {}", c.code_type, c.title),
        }],
    }));

    let mut vs = ValueSet::new(PublicationStatus::Active);
    vs.id = Some(DUAL_CODING_VALUE_SET_ID.to_string());
    vs.url = Some(settings.url("ValueSet/dual-coding-autocomplete"));
    vs.version = Some(settings.namaste_version.clone());
    vs.name = Some("DualCodingAutoComplete".to_string());
    vs.title = Some("Dual Coding AutoComplete ValueSet".to_string());
    vs.date = Some(settings.now());
    vs.expansion = Some(ValueSetExpansion {
        identifier: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
        timestamp: settings.now(),
        total: Some(items.len() as u32),
        offset: None,
        contains: items,
    });
    vs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_filter_is_a_literal_regex() {
        let params = ValueSetFilterParams {
            filter: Some(" jvara (acute)+ ".to_string()),
            system: Some(TraditionalSystem::Siddha),
        };
        let compose = compose(&SystemUris::default(), &params);
        let filters = &compose.include[0].filter;
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].op, "regex");
        assert_eq!(filters[0].value, r".*jvara \(acute\)\+.*");

        let pattern = regex::Regex::new(&filters[0].value).unwrap();
        assert!(pattern.is_match("Vataja jvara (acute)+"));
        assert!(!pattern.is_match("Vataja jvara acuteee"));
        assert_eq!(filters[1].value, TraditionalSystem::Siddha.as_str());
    }
}
