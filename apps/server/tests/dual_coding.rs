//! Dual-coding workflow: Conditions, problem list, Bundle processing
//!
//! Tests cover:
//! - Condition creation attaches every usable ICD-11 translation
//! - Zero mappings still yields a valid Condition with only the NAMASTE coding
//! - Problem-list search, suggestions, pair validation and autocomplete
//! - Bundle processing of NAMASTE-only Conditions

#![allow(unused)]
#[allow(unused)]
mod support;

use axum::http::{header, Method, StatusCode};
use serde_json::json;
use support::{
    assert_bundle_type, assert_outcome, assert_resource_type, assert_status, coding_codes,
    condition_body, get_bundle_entries, namaste_condition, param, params_named, parse_json, part,
    systems, to_json_body, TestApp,
};

#[tokio::test]
async fn condition_carries_namaste_and_icd11_codings() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, headers, body) = app
        .request(
            Method::POST,
            "/fhir/Condition",
            Some(to_json_body(&condition_body("AAE-16", "p1"))?),
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "create condition");
    let condition = parse_json(&body)?;
    assert_resource_type(&condition, "Condition");

    let id = condition["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some(format!("http://localhost:8080/fhir/Condition/{id}").as_str())
    );

    assert_eq!(coding_codes(&condition["code"]), vec!["AAE-16", "SK00", "MG26"]);
    assert_eq!(condition["code"]["coding"][0]["system"], systems::NAMASTE);
    assert_eq!(condition["subject"]["reference"], "Patient/p1");
    assert_eq!(condition["clinicalStatus"]["coding"][0]["code"], "active");
    assert_eq!(condition["verificationStatus"]["coding"][0]["code"], "confirmed");
    assert_eq!(condition["category"][0]["coding"][0]["code"], "encounter-diagnosis");
    assert_eq!(condition["onsetDateTime"], "2024-03-01");
    assert_eq!(condition["note"][0]["text"], "Evening fever for three days");

    let (status, read) = app.get_json(&format!("/fhir/Condition/{id}")).await?;
    assert_status(status, StatusCode::OK, "read condition");
    assert_eq!(read["id"], condition["id"]);
    Ok(())
}

#[tokio::test]
async fn zero_mappings_yield_only_the_namaste_coding() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, condition) = app
        .send_json(Method::POST, "/fhir/Condition", &condition_body("UN-7", "p2"))
        .await?;
    assert_status(status, StatusCode::CREATED, "unmapped code");
    assert_eq!(coding_codes(&condition["code"]), vec!["UN-7"]);

    // UNMATCHED edges are not translations either
    let (_, condition) = app
        .send_json(Method::POST, "/fhir/Condition", &condition_body("SI-1", "p2"))
        .await?;
    assert_eq!(coding_codes(&condition["code"]), vec!["SI-1"]);
    Ok(())
}

#[tokio::test]
async fn condition_requests_are_validated() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, outcome) = app
        .send_json(Method::POST, "/fhir/Condition", &condition_body("NOPE-1", "p1"))
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown NAMASTE code");
    assert_outcome(&outcome, "not-found")?;

    let mut bad_status = condition_body("AAE-16", "p1");
    bad_status["clinicalStatus"] = json!("remission");
    let (status, outcome) = app
        .send_json(Method::POST, "/fhir/Condition", &bad_status)
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "bad clinical status");
    assert_outcome(&outcome, "invalid")?;

    let mut bad_date = condition_body("AAE-16", "p1");
    bad_date["onsetDate"] = json!("01/03/2024");
    let (status, _) = app.send_json(Method::POST, "/fhir/Condition", &bad_date).await?;
    assert_status(status, StatusCode::BAD_REQUEST, "bad onset date");

    let (status, _) = app.get_json("/fhir/Condition/does-not-exist").await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown condition");
    Ok(())
}

#[tokio::test]
async fn problem_list_collects_a_patients_conditions() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, item) = app
        .send_json(
            Method::POST,
            "/fhir/ProblemList/Condition",
            &condition_body("AAE-16", "p3"),
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "problem list item");
    assert_eq!(item["category"][0]["coding"][0]["code"], "problem-list-item");

    app.send_json(Method::POST, "/fhir/Condition", &condition_body("UN-7", "p3"))
        .await?;
    app.send_json(Method::POST, "/fhir/Condition", &condition_body("UN-7", "p4"))
        .await?;

    let (status, bundle) = app
        .get_json("/fhir/ProblemList/Condition?patient=Patient/p3")
        .await?;
    assert_status(status, StatusCode::OK, "problem list search");
    assert_bundle_type(&bundle, "searchset")?;
    assert_eq!(bundle["total"], 2);
    assert_eq!(get_bundle_entries(&bundle)?.len(), 2);

    let (status, outcome) = app.get_json("/fhir/ProblemList/Condition").await?;
    assert_status(status, StatusCode::BAD_REQUEST, "patient is required");
    assert_outcome(&outcome, "invalid")?;
    Ok(())
}

#[tokio::test]
async fn bundle_dual_codes_single_namaste_conditions() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let input = json!({
        "resourceType": "Bundle",
        "id": "visit-1",
        "type": "collection",
        "entry": [
            { "fullUrl": "urn:uuid:c1", "resource": namaste_condition("AAE-16", "p1") },
            { "resource": { "resourceType": "Patient", "id": "p1" } },
            { "resource": namaste_condition("NOPE-1", "p1") }
        ]
    });
    let (status, output) = app.send_json(Method::POST, "/fhir/Bundle", &input).await?;
    assert_status(status, StatusCode::OK, "process bundle");
    assert_bundle_type(&output, "collection")?;
    assert_eq!(output["id"], "processed-visit-1");

    let entries = get_bundle_entries(&output)?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["fullUrl"], "urn:uuid:c1");
    assert_eq!(
        coding_codes(&entries[0]["resource"]["code"]),
        vec!["AAE-16", "SK00", "MG26"]
    );
    assert_eq!(entries[0]["resource"]["code"]["text"], "Fever");
    assert_eq!(entries[1]["resource"]["resourceType"], "Patient");
    assert_eq!(coding_codes(&entries[2]["resource"]["code"]), vec!["NOPE-1"]);

    let (status, _) = app
        .send_json(Method::POST, "/fhir/Bundle", &json!({ "resourceType": "Patient" }))
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "not a bundle");
    Ok(())
}

#[tokio::test]
async fn coding_suggestions_list_translations_per_partition() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, suggestions) = app
        .get_json("/fhir/ProblemList/coding-suggestions/AAE-16")
        .await?;
    assert_status(status, StatusCode::OK, "suggestions");
    assert_eq!(param(&suggestions, "namaste")?["valueCoding"]["code"], "AAE-16");
    let tm2 = param(&suggestions, "tm2")?;
    assert_eq!(part(tm2, "concept")?["valueCoding"]["code"], "SK00");
    let biomedicine = param(&suggestions, "biomedicine")?;
    assert_eq!(part(biomedicine, "concept")?["valueCoding"]["code"], "MG26");

    let (status, _) = app
        .get_json("/fhir/ProblemList/coding-suggestions/NOPE-1")
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown suggestion source");
    Ok(())
}

#[tokio::test]
async fn validate_coding_needs_a_usable_mapping() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, valid) = app
        .send_json(
            Method::POST,
            "/fhir/ProblemList/validate-coding",
            &json!({ "namasteCode": "AAE-16", "icd11Code": "SK00", "system": "TM2" }),
        )
        .await?;
    assert_status(status, StatusCode::OK, "valid pair");
    assert_eq!(param(&valid, "valid")?["valueBoolean"], true);
    assert!(params_named(&valid, "error").is_empty());

    let (_, unmatched) = app
        .send_json(
            Method::POST,
            "/fhir/ProblemList/validate-coding",
            &json!({ "namasteCode": "SI-1", "icd11Code": "SK01", "system": "TM2" }),
        )
        .await?;
    assert_eq!(param(&unmatched, "valid")?["valueBoolean"], false);
    assert_eq!(params_named(&unmatched, "error").len(), 1);

    let (_, unknown) = app
        .send_json(
            Method::POST,
            "/fhir/ProblemList/validate-coding",
            &json!({ "namasteCode": "NOPE-1", "icd11Code": "ZZ99" }),
        )
        .await?;
    assert_eq!(params_named(&unknown, "error").len(), 2);
    Ok(())
}

#[tokio::test]
async fn dual_coding_autocomplete_mixes_vocabularies() -> anyhow::Result<()> {
    let app = TestApp::seeded().await?;

    let (status, vs) = app
        .get_json("/fhir/ProblemList/ValueSet/dual-coding-autocomplete?term=fever&limit=5")
        .await?;
    assert_status(status, StatusCode::OK, "autocomplete");
    assert_resource_type(&vs, "ValueSet");
    let codes: Vec<&str> = vs["expansion"]["contains"]
        .as_array()
        .map(|items| items.iter().filter_map(|c| c["code"].as_str()).collect())
        .unwrap_or_default();
    assert!(codes.contains(&"SK00") && codes.contains(&"MG26"), "{codes:?}");

    let (_, short) = app
        .get_json("/fhir/ProblemList/ValueSet/dual-coding-autocomplete?term=f")
        .await?;
    assert_eq!(short["expansion"]["total"], 0);
    Ok(())
}
