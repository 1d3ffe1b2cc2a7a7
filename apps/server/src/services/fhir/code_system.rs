use super::FhirSettings;
use crate::db::Snapshot;
use ayush_fhir_models::{
    CodeSystem, CodeSystemConcept, CodeSystemConceptProperty, CodeSystemContentMode,
    CodeSystemProperty, PublicationStatus,
};

pub const CODE_SYSTEM_ID: &str = "namaste-codes";

/// The NAMASTE CodeSystem, one concept per registered code in code order
pub fn namaste_code_system(snapshot: &Snapshot, settings: &FhirSettings) -> CodeSystem {
    let mut cs = CodeSystem::new(
        snapshot.systems().namaste.clone(),
        PublicationStatus::Active,
        CodeSystemContentMode::Complete,
    );
    cs.id = Some(CODE_SYSTEM_ID.to_string());
    cs.version = Some(settings.namaste_version.clone());
    cs.name = Some("NAMASTE".to_string());
    cs.title = Some(
        "National AYUSH Morbidity & Standardized Terminologies Electronic".to_string(),
    );
    cs.date = Some(settings.now());
    cs.publisher = Some(settings.publisher.clone());
    cs.description =
        Some("Standardized terminology codes for Ayurveda, Siddha and Unani disorders".to_string());
    cs.case_sensitive = Some(true);
    cs.value_set = Some(settings.url("ValueSet/namaste"));
    cs.property = vec![
        CodeSystemProperty::new("system", "code", "Traditional medicine system"),
        CodeSystemProperty::new("category", "string", "Disorder category"),
        CodeSystemProperty::new("subcategory", "string", "Disorder subcategory"),
        CodeSystemProperty::new(
            "who-terminology",
            "string",
            "WHO Standardised International Terminology code",
        ),
    ];

    for code in snapshot.list_namaste(None) {
        let mut property = vec![CodeSystemConceptProperty::code("system", code.system.as_str())];
        if let Some(category) = &code.category {
            property.push(CodeSystemConceptProperty::string("category", category));
        }
        if let Some(subcategory) = &code.subcategory {
            property.push(CodeSystemConceptProperty::string("subcategory", subcategory));
        }
        if let Some(who) = &code.who_terminology_code {
            property.push(CodeSystemConceptProperty::string("who-terminology", who));
        }
        cs.concept.push(CodeSystemConcept {
            code: code.code,
            display: Some(code.display),
            definition: code.definition,
            property,
        });
    }
    cs.count = Some(cs.concept.len() as u32);
    cs
}
