//! FHIR resource reads: metadata, CodeSystem, ConceptMap, ValueSet

use super::{fhir_response, parse_system};
use crate::services::ValueSetFilterParams;
use crate::state::AppState;
use crate::{Error, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use ayush_fhir_models::Resource;
use std::collections::HashMap;

/// GET /fhir/metadata
pub async fn capability_statement(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let statement = state.fhir.capability_statement().to_value()?;
    let mut response = fhir_response(StatusCode::OK, &statement, &query, &headers)?;

    let etag = format!("W/\"{}\"", state.fhir.settings().software_version);
    response.headers_mut().insert(
        "etag",
        etag.parse()
            .map_err(|e| Error::Internal(format!("Invalid ETag: {e}")))?,
    );
    Ok(response)
}

/// GET /fhir/CodeSystem/namaste-codes
pub async fn code_system(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let resource = state.fhir.code_system()?;
    fhir_response(StatusCode::OK, &resource, &query, &headers)
}

/// GET /fhir/ConceptMap/namaste-to-icd11
pub async fn concept_map(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let resource = state.fhir.concept_map()?;
    fhir_response(StatusCode::OK, &resource, &query, &headers)
}

pub(crate) fn value_set_filter(query: &HashMap<String, String>) -> Result<ValueSetFilterParams> {
    Ok(ValueSetFilterParams {
        filter: query.get("filter").cloned(),
        system: parse_system(query.get("system").map(String::as_str))?,
    })
}

/// GET /fhir/ValueSet/namaste?filter&system
pub async fn value_set(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response> {
    let params = value_set_filter(&query)?;
    let resource = state.fhir.value_set(&params).to_value()?;
    fhir_response(StatusCode::OK, &resource, &query, &headers)
}
