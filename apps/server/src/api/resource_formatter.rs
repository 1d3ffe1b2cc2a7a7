//! Resource formatting
//!
//! Renders FHIR resources according to content negotiation (JSON or XML,
//! optional pretty printing) and builds the HTTP response.

use crate::api::content_negotiation::ContentNegotiation;
use crate::Result;
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde_json::Value;

/// Resource formatter that applies content negotiation preferences
pub struct ResourceFormatter {
    negotiation: ContentNegotiation,
}

impl ResourceFormatter {
    pub fn new(negotiation: ContentNegotiation) -> Self {
        Self { negotiation }
    }

    pub fn format_resource(&self, resource: &Value) -> Result<String> {
        Ok(ayush_fhir_format::render(
            resource,
            self.negotiation.format,
            self.negotiation.pretty,
        )?)
    }

    /// Response with the rendered body and a matching Content-Type
    pub fn response(&self, status: StatusCode, resource: &Value) -> Result<Response> {
        let body = self.format_resource(resource)?;
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        let content_type = HeaderValue::from_str(&self.negotiation.content_type())
            .map_err(|e| crate::Error::Internal(format!("Invalid content type: {e}")))?;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
        Ok(response)
    }
}
