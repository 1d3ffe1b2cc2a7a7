//! FHIR content negotiation
//!
//! Format selection uses `_format` first, then the `Accept` header, then JSON.
//! `_pretty=true` indents JSON output.
//!
//! See: http://hl7.org/fhir/http.html#parameters

use ayush_fhir_format::Format;
use axum::http::HeaderMap;
use std::collections::HashMap;

use crate::{Error, Result};

/// Complete content negotiation context for a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentNegotiation {
    pub format: Format,
    pub pretty: bool,
}

impl ContentNegotiation {
    /// An explicit `_format` the server cannot produce is a 415; an unusable
    /// `Accept` header silently falls back to JSON.
    pub fn from_request(query: &HashMap<String, String>, headers: &HeaderMap) -> Result<Self> {
        let format = match query.get("_format").map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(raw) => Format::parse(raw).ok_or_else(|| {
                Error::UnsupportedMediaType(format!(
                    "{raw}. Supported formats: json, xml, application/fhir+json, application/fhir+xml"
                ))
            })?,
            None => Self::format_from_accept(headers).unwrap_or_default(),
        };

        let pretty = query
            .get("_pretty")
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(false);

        Ok(Self { format, pretty })
    }

    /// First supported media type in the Accept header. q-values are not weighed.
    fn format_from_accept(headers: &HeaderMap) -> Option<Format> {
        let accept = headers.get("accept")?.to_str().ok()?;
        accept
            .split(',')
            .filter_map(|part| part.split(';').next())
            .find_map(|media_type| Format::parse(media_type.trim()))
    }

    pub fn content_type(&self) -> String {
        format!("{}; charset=utf-8", self.format.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn format_parameter_wins_over_accept() {
        let mut headers = HeaderMap::new();
        headers.insert("accept", "application/fhir+json".parse().unwrap());
        let cn = ContentNegotiation::from_request(&query(&[("_format", "xml")]), &headers).unwrap();
        assert_eq!(cn.format, Format::Xml);
        assert_eq!(cn.content_type(), "application/fhir+xml; charset=utf-8");
    }

    #[test]
    fn accept_header_is_used_without_format() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "accept",
            "text/html, application/fhir+xml;q=0.9".parse().unwrap(),
        );
        let cn = ContentNegotiation::from_request(&HashMap::new(), &headers).unwrap();
        assert_eq!(cn.format, Format::Xml);
    }

    #[test]
    fn defaults_to_compact_json() {
        let cn = ContentNegotiation::from_request(&HashMap::new(), &HeaderMap::new()).unwrap();
        assert_eq!(cn, ContentNegotiation::default());

        let cn = ContentNegotiation::from_request(&query(&[("_pretty", "true")]), &HeaderMap::new())
            .unwrap();
        assert!(cn.pretty);
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let err = ContentNegotiation::from_request(&query(&[("_format", "ttl")]), &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
    }
}
