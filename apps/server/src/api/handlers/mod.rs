//! Request handlers for API endpoints
//!
//! Handlers extract and check parameters, call a service and format the
//! response. Errors become OperationOutcome bodies through `crate::Error`.

pub mod conditions;
pub mod fhir;
pub mod jobs;
pub mod mappings;
pub mod metrics;
pub mod operations;
pub mod terminology;
pub mod translate;

use crate::api::{content_negotiation::ContentNegotiation, resource_formatter::ResourceFormatter};
use crate::models::{Icd11CodeType, TraditionalSystem};
use crate::{Error, Result};
use axum::{
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde_json::Value;
use std::collections::HashMap;

/// Render a FHIR resource with `_format`/`Accept` negotiation
pub(crate) fn fhir_response(
    status: StatusCode,
    resource: &Value,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<Response> {
    let negotiation = ContentNegotiation::from_request(query, headers)?;
    ResourceFormatter::new(negotiation).response(status, resource)
}

pub(crate) fn parse_system(raw: Option<&str>) -> Result<Option<TraditionalSystem>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => TraditionalSystem::parse(s)
            .map(Some)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown system '{s}'"))),
    }
}

pub(crate) fn parse_code_type(raw: Option<&str>) -> Result<Option<Icd11CodeType>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Icd11CodeType::parse(s)
            .map(Some)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown codeType '{s}'"))),
    }
}
