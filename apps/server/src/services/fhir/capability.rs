use super::FhirSettings;
use ayush_fhir_models::{
    CapabilityImplementation, CapabilityOperation, CapabilityResource, CapabilityRest,
    CapabilitySoftware, CapabilityStatement, PublicationStatus,
};

const OPERATION_BASE: &str = "http://hl7.org/fhir/OperationDefinition";

fn op(name: &str, definition: &str) -> CapabilityOperation {
    CapabilityOperation {
        name: name.to_string(),
        definition: format!("{OPERATION_BASE}/{definition}"),
    }
}

/// Server capability statement; lists only what the router serves
pub fn capability_statement(settings: &FhirSettings) -> CapabilityStatement {
    let code_system = CapabilityResource::new("CodeSystem", &["read"])
        .with_operation("lookup", &format!("{OPERATION_BASE}/CodeSystem-lookup"))
        .with_operation("validate-code", &format!("{OPERATION_BASE}/CodeSystem-validate-code"));

    let concept_map = CapabilityResource::new("ConceptMap", &["read"])
        .with_operation("translate", &format!("{OPERATION_BASE}/ConceptMap-translate"));

    let value_set = CapabilityResource::new("ValueSet", &["read"])
        .with_operation("expand", &format!("{OPERATION_BASE}/ValueSet-expand"))
        .with_search_param("filter", "string", "Display substring")
        .with_search_param("system", "token", "Traditional medicine system");

    let condition = CapabilityResource::new("Condition", &["create", "read", "search-type"])
        .with_search_param("patient", "reference", "Subject patient id");

    let bundle = CapabilityResource::new("Bundle", &["create"]);

    CapabilityStatement {
        resource_type: "CapabilityStatement".to_string(),
        id: Some("namaste-icd11-terminology-capability".to_string()),
        url: Some(settings.url("metadata")),
        version: Some(settings.software_version.clone()),
        name: Some("NAMASTEIcd11TerminologyCapability".to_string()),
        title: Some("NAMASTE-ICD11 FHIR Terminology Service Capability Statement".to_string()),
        status: PublicationStatus::Active,
        date: settings.now(),
        publisher: Some(settings.publisher.clone()),
        description: Some(
            "FHIR terminology service for NAMASTE and ICD-11 dual coding".to_string(),
        ),
        kind: "instance".to_string(),
        software: Some(CapabilitySoftware {
            name: "ayush-terminology".to_string(),
            version: Some(settings.software_version.clone()),
        }),
        implementation: Some(CapabilityImplementation {
            description: "NAMASTE-ICD11 FHIR Terminology Server".to_string(),
            url: Some(settings.base_url.clone()),
        }),
        fhir_version: "4.0.1".to_string(),
        format: vec!["json".to_string(), "xml".to_string()],
        rest: vec![CapabilityRest {
            mode: "server".to_string(),
            resource: vec![code_system, concept_map, value_set, condition, bundle],
            operation: vec![op("translate", "ConceptMap-translate")],
        }],
    }
}
