//! FHIR terminology operations
//!
//! GET reads parameters from the query string. POST may also carry a
//! Parameters body; query values win when both name the same parameter.

use super::fhir::value_set_filter;
use super::fhir_response;
use crate::api::extractors::parse_fhir_body;
use crate::services::fhir::value_set::VALUE_SET_ID;
use crate::state::AppState;
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::Response,
};
use ayush_fhir_models::{Parameters, Resource};
use serde_json::Value;
use std::collections::HashMap;

/// Merge query parameters with a Parameters body.
/// A `coding` parameter supplies `code` and `system` when those are absent.
fn operation_params(
    mut query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<HashMap<String, String>> {
    let Some(value) = parse_fhir_body(body, headers)? else {
        return Ok(query);
    };
    let parameters = Parameters::from_value(&value)?;
    for parameter in &parameters.parameter {
        match parameter.any_value() {
            Some(Value::String(s)) => {
                query.entry(parameter.name.clone()).or_insert_with(|| s.clone());
            }
            Some(Value::Bool(b)) => {
                query.entry(parameter.name.clone()).or_insert_with(|| b.to_string());
            }
            Some(Value::Number(n)) => {
                query.entry(parameter.name.clone()).or_insert_with(|| n.to_string());
            }
            Some(Value::Object(coding)) if parameter.name == "coding" => {
                for field in ["code", "system", "display"] {
                    if let Some(v) = coding.get(field).and_then(Value::as_str) {
                        query.entry(field.to_string()).or_insert_with(|| v.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    Ok(query)
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

fn parse_usize(params: &HashMap<String, String>, name: &str) -> Result<Option<usize>> {
    param(params, name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::InvalidParameter(format!("{name} must be a non-negative integer")))
        })
        .transpose()
}

/// GET|POST /fhir/ConceptMap/namaste-to-icd11/$translate
pub async fn translate(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let params = operation_params(query, &headers, &body)?;
    let result = state.fhir.translate(
        param(&params, "code"),
        param(&params, "system"),
        param(&params, "targetsystem").or_else(|| param(&params, "targetSystem")),
    )?;
    fhir_response(StatusCode::OK, &result.to_value()?, &params, &headers)
}

/// GET|POST /fhir/CodeSystem/$lookup
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let params = operation_params(query, &headers, &body)?;
    let result = state
        .fhir
        .lookup(param(&params, "system"), param(&params, "code"))?;
    fhir_response(StatusCode::OK, &result.to_value()?, &params, &headers)
}

/// GET|POST /fhir/CodeSystem/$validate-code
pub async fn validate_code(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let params = operation_params(query, &headers, &body)?;
    let system = param(&params, "system").or_else(|| param(&params, "url"));
    let result = state.fhir.validate_code(
        system,
        param(&params, "code"),
        param(&params, "display"),
    )?;
    fhir_response(StatusCode::OK, &result.to_value()?, &params, &headers)
}

/// GET|POST /fhir/ValueSet/$expand and /fhir/ValueSet/namaste/$expand
pub async fn expand(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let params = operation_params(query, &headers, &body)?;
    if let Some(url) = param(&params, "url") {
        let own = state.fhir.settings().url(&format!("ValueSet/{VALUE_SET_ID}"));
        if url.trim() != own {
            return Err(Error::NotFound(format!("ValueSet {url}")));
        }
    }
    let filter = value_set_filter(&params)?;
    let count = parse_usize(&params, "count")?;
    let offset = parse_usize(&params, "offset")?;
    let result = state.fhir.expand(&filter, count, offset).to_value()?;
    fhir_response(StatusCode::OK, &result, &params, &headers)
}

/// Fallback for `/fhir/*`: `$operation` segments are unknown operations, anything else is not found
pub async fn fallback(uri: Uri) -> Error {
    let path = uri.path();
    match path.split('/').find(|s| s.starts_with('$')) {
        Some(operation) => Error::UnknownOperation(format!("{operation} on {path}")),
        None => Error::NotFound(format!("no FHIR endpoint at {path}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_parameters_fill_gaps_in_the_query() {
        let body = json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "code", "valueCode": "FROM-BODY"},
                {"name": "targetsystem", "valueUri": "http://id.who.int/icd/release/11/mms/tm2"}
            ]
        });
        let query: HashMap<String, String> =
            [("code".to_string(), "FROM-QUERY".to_string())].into_iter().collect();
        let params =
            operation_params(query, &HeaderMap::new(), body.to_string().as_bytes()).unwrap();
        assert_eq!(params["code"], "FROM-QUERY");
        assert_eq!(
            params["targetsystem"],
            "http://id.who.int/icd/release/11/mms/tm2"
        );
    }

    #[test]
    fn coding_parameter_supplies_code_and_system() {
        let body = json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "coding", "valueCoding": {
                "system": "https://ayush.gov.in/fhir/CodeSystem/namaste",
                "code": "AAE-16"
            }}]
        });
        let params =
            operation_params(HashMap::new(), &HeaderMap::new(), body.to_string().as_bytes())
                .unwrap();
        assert_eq!(params["code"], "AAE-16");
        assert_eq!(params["system"], "https://ayush.gov.in/fhir/CodeSystem/namaste");
    }

    #[test]
    fn non_parameters_bodies_are_rejected() {
        let body = json!({"resourceType": "Patient"}).to_string();
        assert!(operation_params(HashMap::new(), &HeaderMap::new(), body.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn fallback_distinguishes_operations() {
        let err = fallback("/fhir/Patient/$everything".parse().unwrap()).await;
        assert!(matches!(err, Error::UnknownOperation(_)));
        let err = fallback("/fhir/Patient/1".parse().unwrap()).await;
        assert!(matches!(err, Error::NotFound(_)));
    }
}
