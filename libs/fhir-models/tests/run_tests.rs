use ayush_fhir_models::common::{
    Bundle, BundleType, CodeSystem, ConceptMap, Condition, Error, OperationOutcome, Parameters,
    Resource, ValueSet,
};
use serde_json::json;

#[test]
fn parse_dual_coded_condition() {
    let condition = Condition::from_value(&json!({
        "resourceType": "Condition",
        "id": "c-1",
        "clinicalStatus": { "coding": [{
            "system": "http://terminology.hl7.org/CodeSystem/condition-clinical",
            "code": "active"
        }]},
        "code": { "coding": [
            { "system": "https://ayush.gov.in/fhir/CodeSystem/namaste", "code": "AAE-16" },
            { "system": "http://id.who.int/icd/release/11/mms/tm2", "code": "SP90" }
        ]},
        "subject": { "reference": "Patient/p-7" },
        "encounter": { "reference": "Encounter/e-1" }
    }))
    .expect("condition should parse");

    assert_eq!(condition.id.as_deref(), Some("c-1"));
    assert_eq!(condition.patient_id(), Some("p-7"));
    let code = condition.code.as_ref().expect("code present");
    assert_eq!(
        code.codings_from("http://id.who.int/icd/release/11/mms/tm2")
            .count(),
        1
    );
    // Unmodelled elements survive a round trip.
    let back = condition.to_value().unwrap();
    assert_eq!(back["encounter"]["reference"], "Encounter/e-1");
}

#[test]
fn from_value_rejects_wrong_resource_type() {
    let err = ValueSet::from_value(&json!({ "resourceType": "CodeSystem" })).unwrap_err();
    assert!(matches!(err, Error::ResourceTypeMismatch { .. }));

    let err = Parameters::from_value(&json!({ "parameter": [] })).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

#[test]
fn parse_concept_map_groups() {
    let cm = ConceptMap::from_value(&json!({
        "resourceType": "ConceptMap",
        "url": "http://localhost:8080/fhir/ConceptMap/namaste-to-icd11",
        "status": "active",
        "group": [{
            "source": "https://ayush.gov.in/fhir/CodeSystem/namaste",
            "target": "http://id.who.int/icd/release/11/mms",
            "element": [{
                "code": "AAE-16",
                "target": [
                    { "code": "MG26", "equivalence": "relatedto" },
                    { "code": "1D01", "equivalence": "inexact" }
                ]
            }]
        }]
    }))
    .unwrap();

    assert_eq!(cm.group.len(), 1);
    assert_eq!(cm.target_count(), 2);
}

#[test]
fn code_system_requires_content_mode() {
    let result = CodeSystem::from_value(&json!({
        "resourceType": "CodeSystem",
        "url": "https://ayush.gov.in/fhir/CodeSystem/namaste",
        "status": "active"
    }));
    assert!(result.is_err());
}

#[test]
fn outcome_and_bundle_builders() {
    let outcome = OperationOutcome::error("not-found", "Unknown code AAE-99");
    assert!(outcome.has_errors());
    assert_eq!(outcome.to_value().unwrap()["issue"][0]["code"], "not-found");

    let info = OperationOutcome::information("Bundle processed");
    assert!(!info.has_errors());

    let bundle = Bundle::new(BundleType::Searchset);
    assert_eq!(bundle.to_value().unwrap()["type"], "searchset");
}
