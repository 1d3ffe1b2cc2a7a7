//! Custom Axum extractors whose rejections are OperationOutcome errors.

use crate::Error;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
};
use ayush_fhir_format::Format;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// FHIR resource body in `application/fhir+json` or `application/fhir+xml`
/// (plus the generic JSON and XML media types).
///
/// XML is converted to JSON so handlers always work with `serde_json::Value`.
/// A missing Content-Type is read as JSON.
pub struct FhirBody(pub JsonValue);

fn body_format(headers: &HeaderMap) -> Result<Format, Error> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim();
    if content_type.is_empty() {
        return Ok(Format::Json);
    }
    Format::parse(content_type).ok_or_else(|| Error::UnsupportedMediaType(content_type.to_string()))
}

#[async_trait]
impl<S> FromRequest<S> for FhirBody
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let format = body_format(req.headers())?;
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::Validation(format!("Failed to read request body: {e}")))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| Error::Validation("Request body is not valid UTF-8".to_string()))?;
        let value = ayush_fhir_format::parse(text, format)?;
        Ok(FhirBody(value))
    }
}

/// `axum::Json` with validation-error rejections
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// `axum::extract::Query` with invalid-parameter rejections
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| Error::InvalidParameter(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Parse an optional FHIR body read as raw bytes. An empty body is `None`.
pub fn parse_fhir_body(bytes: &[u8], headers: &HeaderMap) -> crate::Result<Option<JsonValue>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let format = body_format(headers)?;
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::Validation("Request body is not valid UTF-8".to_string()))?;
    Ok(Some(ayush_fhir_format::parse(text, format)?))
}
