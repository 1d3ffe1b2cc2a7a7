//! Prometheus metrics for the terminology server

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "terminology_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    /// In-flight HTTP requests
    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "terminology_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Terminology Metrics

    /// Translations by direction and outcome (direct, bridged, empty, not_found)
    pub static ref TRANSLATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_translations_total",
        "Total number of translation requests",
        &["direction", "outcome"]
    )
    .expect("Failed to register TRANSLATIONS_TOTAL");

    /// Search and autocomplete requests by vocabulary
    pub static ref SEARCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_searches_total",
        "Total number of search and autocomplete requests",
        &["vocabulary", "kind"]
    )
    .expect("Failed to register SEARCHES_TOTAL");

    /// Mapping writes by action (created, updated, deleted) and origin
    pub static ref MAPPING_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_mapping_writes_total",
        "Total number of mapping writes",
        &["action", "origin"]
    )
    .expect("Failed to register MAPPING_WRITES_TOTAL");

    /// Snapshot publish retries caused by concurrent writers
    pub static ref SNAPSHOT_PUBLISH_RETRIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_snapshot_publish_retries_total",
        "Compare-and-swap retries while publishing a snapshot",
        &["writer"]
    )
    .expect("Failed to register SNAPSHOT_PUBLISH_RETRIES_TOTAL");

    /// Registry and graph sizes
    pub static ref STORE_ENTRIES: IntGaugeVec = register_int_gauge_vec!(
        "terminology_store_entries",
        "Number of entries held by the store",
        &["kind"]
    )
    .expect("Failed to register STORE_ENTRIES");

    // Job Metrics

    /// Jobs enqueued
    pub static ref JOBS_ENQUEUED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_jobs_enqueued_total",
        "Total number of jobs enqueued",
        &["job_type"]
    )
    .expect("Failed to register JOBS_ENQUEUED_TOTAL");

    /// Jobs completed by final status
    pub static ref JOBS_COMPLETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "terminology_jobs_completed_total",
        "Total number of jobs completed",
        &["job_type", "status"]
    )
    .expect("Failed to register JOBS_COMPLETED_TOTAL");

    /// Job duration
    pub static ref JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "terminology_job_duration_seconds",
        "Job execution duration in seconds",
        &["job_type"],
        vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]
    )
    .expect("Failed to register JOB_DURATION_SECONDS");
}

/// Record registry and graph sizes after a publish
pub fn record_store_sizes(namaste: usize, icd11: usize, mappings: usize) {
    STORE_ENTRIES
        .with_label_values(&["namaste_codes"])
        .set(namaste as i64);
    STORE_ENTRIES
        .with_label_values(&["icd11_codes"])
        .set(icd11 as i64);
    STORE_ENTRIES
        .with_label_values(&["mappings"])
        .set(mappings as i64);
}

/// Replace path segments that carry codes or ids so label cardinality stays bounded
pub fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for (i, &segment) in segments.iter().enumerate() {
        let prev = if i > 0 { Some(segments[i - 1]) } else { None };
        let replaced = match (segments[0], prev) {
            ("terminology", Some("namaste-to-tm2"))
            | ("terminology", Some("tm2-to-namaste"))
            | ("terminology", Some("namaste-to-biomedicine")) => "{code}",
            ("terminology", Some("mapping")) => "{id}",
            ("terminology", Some("jobs")) => "{id}",
            ("terminology", Some("namaste")) | ("terminology", Some("icd11"))
                if !matches!(
                    segment,
                    "search" | "autocomplete" | "categories" | "chapters"
                ) =>
            {
                "{system}"
            }
            ("terminology", _) if i == 3 && matches!(segments[1], "namaste" | "icd11") => {
                "{code}"
            }
            ("fhir", Some("coding-suggestions")) => "{code}",
            ("fhir", Some("Condition")) if i == 2 => "{id}",
            _ => segment,
        };
        out.push(replaced);
    }

    format!("/{}", out.join("/"))
}

/// Extract FHIR resource type from path
pub fn extract_resource_type(path: &str) -> Option<String> {
    let path = path
        .strip_prefix("/fhir/")
        .or_else(|| path.strip_prefix("/fhir"))?;
    let first = path.split('/').find(|s| !s.is_empty())?;

    if first.starts_with('_') || first.starts_with('$') || first == "metadata" {
        return None;
    }
    if first == "ProblemList" {
        return Some("Condition".to_string());
    }

    Some(first.to_string())
}

/// Extract FHIR interaction or `$operation` from path and method
pub fn extract_operation(method: &str, path: &str) -> Option<String> {
    let path = path
        .strip_prefix("/fhir/")
        .or_else(|| path.strip_prefix("/fhir"))?;

    if let Some(op) = path.split('/').find(|s| s.starts_with('$')) {
        return Some(op.to_string());
    }
    if path == "metadata" {
        return Some("capabilities".to_string());
    }

    let segments = path.split('/').filter(|s| !s.is_empty()).count();
    match method {
        "GET" if segments == 1 => Some("search".to_string()),
        "GET" => Some("read".to_string()),
        "POST" => Some("create".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/"), "/");
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(
            sanitize_path("/terminology/translate/namaste-to-tm2/AY001"),
            "/terminology/translate/namaste-to-tm2/{code}"
        );
        assert_eq!(
            sanitize_path("/terminology/mapping/42"),
            "/terminology/mapping/{id}"
        );
        assert_eq!(
            sanitize_path("/terminology/namaste/search"),
            "/terminology/namaste/search"
        );
        assert_eq!(
            sanitize_path("/terminology/namaste/AYURVEDA/AY001"),
            "/terminology/namaste/{system}/{code}"
        );
        assert_eq!(
            sanitize_path("/terminology/admin/jobs/abc/cancel"),
            "/terminology/admin/jobs/{id}/cancel"
        );
        assert_eq!(
            sanitize_path("/fhir/ConceptMap/namaste-to-icd11/$translate"),
            "/fhir/ConceptMap/namaste-to-icd11/$translate"
        );
        assert_eq!(
            sanitize_path("/fhir/ProblemList/coding-suggestions/AY001"),
            "/fhir/ProblemList/coding-suggestions/{code}"
        );
    }

    #[test]
    fn test_extract_resource_type() {
        assert_eq!(
            extract_resource_type("/fhir/ConceptMap/namaste-to-icd11"),
            Some("ConceptMap".to_string())
        );
        assert_eq!(
            extract_resource_type("/fhir/ProblemList/Condition"),
            Some("Condition".to_string())
        );
        assert_eq!(extract_resource_type("/fhir/metadata"), None);
        assert_eq!(extract_resource_type("/terminology/stats"), None);
    }

    #[test]
    fn test_extract_operation() {
        assert_eq!(
            extract_operation("GET", "/fhir/ConceptMap/namaste-to-icd11/$translate"),
            Some("$translate".to_string())
        );
        assert_eq!(
            extract_operation("GET", "/fhir/metadata"),
            Some("capabilities".to_string())
        );
        assert_eq!(
            extract_operation("GET", "/fhir/CodeSystem/namaste-codes"),
            Some("read".to_string())
        );
        assert_eq!(
            extract_operation("POST", "/fhir/Condition"),
            Some("create".to_string())
        );
        assert_eq!(extract_operation("GET", "/terminology/stats"), None);
    }
}
