//! Dual-coding endpoints: Conditions, problem list and Bundle processing

use super::fhir_response;
use crate::api::extractors::{ApiJson, FhirBody};
use crate::models::{CreateConditionRequest, ValidateCodingRequest};
use crate::services::ConditionCategory;
use crate::state::AppState;
use crate::{Error, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use ayush_fhir_models::{Bundle, Condition, Resource};
use std::collections::HashMap;

fn created(
    state: &AppState,
    condition: &Condition,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<Response> {
    let mut response = fhir_response(StatusCode::CREATED, &condition.to_value()?, query, headers)?;
    if let Some(id) = &condition.id {
        let location = state.fhir.settings().url(&format!("Condition/{id}"));
        let value = HeaderValue::from_str(&location)
            .map_err(|e| Error::Internal(format!("Invalid Location: {e}")))?;
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// POST /fhir/Condition
pub async fn create_condition(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateConditionRequest>,
) -> Result<Response> {
    let condition = state
        .dual_coding
        .create_condition(request, ConditionCategory::EncounterDiagnosis)?;
    created(&state, &condition, &query, &headers)
}

/// POST /fhir/ProblemList/Condition
pub async fn create_problem_list_condition(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateConditionRequest>,
) -> Result<Response> {
    let condition = state
        .dual_coding
        .create_condition(request, ConditionCategory::ProblemListItem)?;
    created(&state, &condition, &query, &headers)
}

/// GET /fhir/Condition/{id}
pub async fn read_condition(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let condition = state.dual_coding.get_condition(&id)?;
    fhir_response(StatusCode::OK, &condition.to_value()?, &query, &headers)
}

/// GET /fhir/ProblemList/Condition?patient=
pub async fn problem_list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let patient = query
        .get("patient")
        .map(|p| p.trim().trim_start_matches("Patient/"))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::InvalidParameter("patient is required".to_string()))?;
    let bundle = state.dual_coding.conditions_for_patient(patient)?;
    fhir_response(StatusCode::OK, &bundle.to_value()?, &query, &headers)
}

/// POST /fhir/Bundle
pub async fn process_bundle(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    FhirBody(body): FhirBody,
) -> Result<Response> {
    let bundle = Bundle::from_value(&body)?;
    let processed = state.dual_coding.process_bundle(bundle)?;
    fhir_response(StatusCode::OK, &processed.to_value()?, &query, &headers)
}

/// GET /fhir/ProblemList/ValueSet/dual-coding-autocomplete?term&limit
pub async fn dual_coding_autocomplete(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let term = query.get("term").map(|t| t.trim()).unwrap_or_default();
    let limit = query
        .get("limit")
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| Error::InvalidParameter("limit must be a non-negative integer".into()))
        })
        .transpose()?;
    let value_set = state.dual_coding.autocomplete(term, limit);
    fhir_response(StatusCode::OK, &value_set.to_value()?, &query, &headers)
}

/// GET /fhir/ProblemList/coding-suggestions/{namasteCode}
pub async fn coding_suggestions(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let parameters = state.dual_coding.coding_suggestions(&code)?;
    fhir_response(StatusCode::OK, &parameters.to_value()?, &query, &headers)
}

/// POST /fhir/ProblemList/validate-coding
pub async fn validate_coding(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ValidateCodingRequest>,
) -> Result<Response> {
    let parameters = state.dual_coding.validate_coding(request)?;
    fhir_response(StatusCode::OK, &parameters.to_value()?, &query, &headers)
}
