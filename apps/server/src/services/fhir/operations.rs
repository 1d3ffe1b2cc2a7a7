//! Terminology operation bodies: `$translate`, `$lookup`, `$validate-code`

use super::FhirSettings;
use crate::db::{ConceptRef, Snapshot};
use crate::models::{Icd11CodeType, TranslationMatch, Vocabulary};
use crate::{Error, Result};
use ayush_fhir_models::{Coding, Parameter, Parameters};

fn vocabulary_name(vocabulary: Vocabulary) -> &'static str {
    match vocabulary {
        Vocabulary::Namaste => "NAMASTE",
        Vocabulary::Icd11(Icd11CodeType::Tm2) => "ICD-11 TM2",
        Vocabulary::Icd11(Icd11CodeType::Biomedicine) => "ICD-11 Biomedicine",
    }
}

/// Resolve the `system` parameter; absent means NAMASTE
pub fn resolve_system(snapshot: &Snapshot, system: Option<&str>) -> Result<(Vocabulary, String)> {
    match system.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok((Vocabulary::Namaste, snapshot.systems().namaste.clone())),
        Some(uri) => snapshot
            .vocabulary(uri)
            .map(|v| (v, snapshot.systems().uri(v).to_string()))
            .ok_or_else(|| Error::InvalidParameter(format!("unknown system '{uri}'"))),
    }
}

pub fn required_code(code: Option<&str>) -> Result<&str> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::InvalidParameter("parameter 'code' is required".to_string()))
}

/// `$translate` output: `result`, `message` when nothing matched, one `match` per target
pub fn translate_parameters(
    concept_map_url: &str,
    code: &str,
    system: &str,
    matches: &[TranslationMatch],
) -> Parameters {
    let mut params = Parameters::new();
    params.add_value_boolean("result", !matches.is_empty());
    if matches.is_empty() {
        params.add_value_string(
            "message",
            format!("No mappings found for code {code} in system {system}"),
        );
        return params;
    }
    for m in matches {
        let mut concept = Coding::new(&m.target_system, &m.target_code);
        if let Some(display) = &m.target_display {
            concept = concept.with_display(display);
        }
        let mut parts = vec![
            Parameter::code("equivalence", m.equivalence.fhir_code()),
            Parameter::coding("concept", &concept),
            Parameter::string("source", concept_map_url),
        ];
        if let Some(via) = &m.via {
            parts.push(Parameter::coding("product", &Coding::new(&via.system, &via.code)));
        }
        params.add_parts("match", parts);
    }
    params
}

/// Unknown code translations report `result = false` instead of failing
pub fn translate_unknown_code(code: &str, system: &str) -> Parameters {
    let mut params = Parameters::new();
    params.add_value_boolean("result", false);
    params.add_value_string("message", format!("Code {code} not found in system {system}"));
    params
}

pub fn lookup(
    snapshot: &Snapshot,
    settings: &FhirSettings,
    system: Option<&str>,
    code: Option<&str>,
) -> Result<Parameters> {
    let (vocabulary, uri) = resolve_system(snapshot, system)?;
    let code = required_code(code)?;
    let concept = snapshot
        .resolve(&uri, code)
        .ok_or_else(|| Error::NotFound(format!("code '{code}' in system {uri}")))?;

    let mut params = Parameters::new();
    params.add_value_string("name", vocabulary_name(vocabulary));
    if vocabulary == Vocabulary::Namaste {
        params.add_value_string("version", settings.namaste_version.clone());
    }
    params.add_value_string("display", concept.display());
    if let Some(definition) = concept.definition() {
        params.add_value_string("definition", definition);
    }

    match concept {
        ConceptRef::Namaste(record) => {
            params.add_parts(
                "property",
                vec![
                    Parameter::code("code", "system"),
                    Parameter::code("value", record.code.system.as_str()),
                ],
            );
            for (name, value) in [
                ("category", &record.code.category),
                ("subcategory", &record.code.subcategory),
                ("who-terminology", &record.code.who_terminology_code),
            ] {
                if let Some(value) = value {
                    params.add_parts(
                        "property",
                        vec![Parameter::code("code", name), Parameter::string("value", value)],
                    );
                }
            }
        }
        ConceptRef::Icd11(icd) => {
            for (language, value) in &icd.synonyms {
                params.add_parts(
                    "designation",
                    vec![
                        Parameter::code("language", language),
                        Parameter::string("value", value),
                    ],
                );
            }
            params.add_parts(
                "property",
                vec![
                    Parameter::code("code", "codeType"),
                    Parameter::code("value", icd.code_type.as_str()),
                ],
            );
            for (name, value) in [("chapter", &icd.chapter), ("parent", &icd.parent)] {
                if let Some(value) = value {
                    params.add_parts(
                        "property",
                        vec![Parameter::code("code", name), Parameter::string("value", value)],
                    );
                }
            }
        }
    }
    Ok(params)
}

pub fn validate_code(
    snapshot: &Snapshot,
    system: Option<&str>,
    code: Option<&str>,
    display: Option<&str>,
) -> Result<Parameters> {
    let (_, uri) = resolve_system(snapshot, system)?;
    let code = required_code(code)?;

    let mut params = Parameters::new();
    let Some(concept) = snapshot.resolve(&uri, code) else {
        params.add_value_boolean("result", false);
        params.add_value_string("message", format!("Code {code} not found in system {uri}"));
        return Ok(params);
    };

    match display.map(str::trim).filter(|d| !d.is_empty()) {
        Some(expected) if !expected.eq_ignore_ascii_case(concept.display()) => {
            params.add_value_boolean("result", false);
            params.add_value_string(
                "message",
                format!(
                    "Display '{expected}' does not match '{}' for code {code}",
                    concept.display()
                ),
            );
        }
        _ => params.add_value_boolean("result", true),
    }
    params.add_value_string("display", concept.display());
    Ok(params)
}
