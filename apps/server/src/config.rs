//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional config
//! file, then `AYUSH__SECTION__KEY` environment variables. A `.env` file is
//! loaded first when present. Checked with `validator` before startup.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use validator::{Validate, ValidationError};

const ENV_PREFIX: &str = "AYUSH";
const DEFAULT_CONFIG_FILE: &str = "config";

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn absolute_uri(uri: &str) -> Result<(), ValidationError> {
    if uri.starts_with("http://") || uri.starts_with("https://") || uri.starts_with("urn:") {
        Ok(())
    } else {
        Err(invalid("absolute_uri", "must be an absolute URI"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub terminology: TerminologyConfig,
    pub ingestion: IngestionConfig,
    #[validate(nested)]
    pub who_api: WhoApiConfig,
    #[validate(nested)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    #[validate(range(min = 1, message = "port must be non-zero"))]
    pub port: u16,
    /// Public base URL of the FHIR endpoint, used in canonical URLs
    #[validate(custom(function = "absolute_uri"))]
    pub base_url: String,
    #[validate(range(min = 1))]
    pub max_request_body_size: usize,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "http://localhost:8080/fhir".to_string(),
            max_request_body_size: 10 * 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Emit audit events on the `audit` target
    pub audit_enabled: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily | hourly | minutely | never
    pub file_rotation: String,
    pub opentelemetry_enabled: bool,
    pub otlp_endpoint: String,
    pub otlp_timeout_seconds: u64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub trace_sample_ratio: f64,
    pub service_name: String,
    pub service_version: Option<String>,
    pub deployment_environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            audit_enabled: true,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "terminology-server".to_string(),
            file_rotation: "daily".to_string(),
            opentelemetry_enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            otlp_timeout_seconds: 10,
            trace_sample_ratio: 1.0,
            service_name: "ayush-terminology".to_string(),
            service_version: None,
            deployment_environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "terminology_consistency"))]
pub struct TerminologyConfig {
    /// Canonical URI of the NAMASTE code system
    #[validate(custom(function = "absolute_uri"))]
    pub namaste_system: String,
    /// Canonical URI of ICD-11 Traditional Medicine Chapter 2
    #[validate(custom(function = "absolute_uri"))]
    pub tm2_system: String,
    /// Canonical URI of the ICD-11 biomedicine (MMS) linearization
    #[validate(custom(function = "absolute_uri"))]
    pub biomedicine_system: String,
    /// Bridge vocabulary for one-hop transitive translation. Empty disables bridging.
    pub bridge_system: Option<String>,
    pub namaste_version: String,
    pub mapping_version: String,
    pub publisher: String,
    #[validate(range(min = 1))]
    pub default_page_size: usize,
    #[validate(range(min = 1))]
    pub max_page_size: usize,
    pub autocomplete_min_chars: usize,
    pub autocomplete_default_limit: usize,
    #[validate(range(min = 1))]
    pub autocomplete_max_limit: usize,
    /// Confidence assigned to machine-generated mappings
    #[validate(range(min = 0.0, max = 1.0))]
    pub generated_confidence: f64,
    pub translation_cache_capacity: usize,
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        let tm2_system = "http://id.who.int/icd/release/11/mms/tm2".to_string();
        Self {
            namaste_system: "https://ayush.gov.in/fhir/CodeSystem/namaste".to_string(),
            bridge_system: Some(tm2_system.clone()),
            tm2_system,
            biomedicine_system: "http://id.who.int/icd/release/11/mms".to_string(),
            namaste_version: "1.0".to_string(),
            mapping_version: "1.0".to_string(),
            publisher: "Ministry of AYUSH, Government of India".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            autocomplete_min_chars: 2,
            autocomplete_default_limit: 10,
            autocomplete_max_limit: 50,
            generated_confidence: 0.8,
            translation_cache_capacity: 1024,
        }
    }
}

impl TerminologyConfig {
    /// Bridge system, ignoring blank values
    pub fn bridge(&self) -> Option<&str> {
        self.bridge_system
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Distinct system URIs, a bridge among them, defaults within their maxima
fn terminology_consistency(t: &TerminologyConfig) -> Result<(), ValidationError> {
    if t.namaste_system == t.tm2_system
        || t.namaste_system == t.biomedicine_system
        || t.tm2_system == t.biomedicine_system
    {
        return Err(invalid("distinct_systems", "terminology system URIs must be distinct"));
    }
    if let Some(bridge) = t.bridge() {
        if ![&t.namaste_system, &t.tm2_system, &t.biomedicine_system]
            .iter()
            .any(|s| s.as_str() == bridge)
        {
            return Err(invalid(
                "unknown_bridge",
                "bridge_system is not one of the configured systems",
            ));
        }
    }
    if t.default_page_size > t.max_page_size {
        return Err(invalid("page_size", "default_page_size exceeds max_page_size"));
    }
    if t.autocomplete_default_limit > t.autocomplete_max_limit {
        return Err(invalid(
            "autocomplete_limit",
            "autocomplete_default_limit exceeds autocomplete_max_limit",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// NAMASTE CSV used by the reload-namaste job and startup load
    pub namaste_csv: Option<PathBuf>,
    /// ICD-11 CSV used by sync-icd11 when the WHO API is not configured
    pub icd11_csv: Option<PathBuf>,
    pub load_on_startup: bool,
    /// Run mapping generation after the startup load
    pub generate_mappings_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "who_api_credentials"))]
pub struct WhoApiConfig {
    pub enabled: bool,
    /// MMS release root, e.g. https://id.who.int/icd/release/11/2019-04/mms
    #[validate(custom(function = "absolute_uri"))]
    pub base_url: String,
    #[validate(custom(function = "absolute_uri"))]
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Path of the TM2 root below `base_url`
    pub tm2_path: String,
    pub language: String,
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
    /// Upper bound on entities fetched per linearization
    #[validate(range(min = 1))]
    pub max_entities: usize,
}

fn who_api_credentials(who: &WhoApiConfig) -> Result<(), ValidationError> {
    if who.enabled && (who.client_id.is_none() || who.client_secret.is_none()) {
        return Err(invalid(
            "credentials",
            "enabled requires client_id and client_secret",
        ));
    }
    Ok(())
}

impl Default for WhoApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://id.who.int/icd/release/11/2019-04/mms".to_string(),
            token_url: "https://icdaccessmanagement.who.int/connect/token".to_string(),
            client_id: None,
            client_secret: None,
            tm2_path: "tm2".to_string(),
            language: "en".to_string(),
            timeout_seconds: 30,
            max_entities: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct JobsConfig {
    #[validate(range(min = 1))]
    pub queue_capacity: usize,
    /// Worker tasks draining the queue
    #[validate(range(min = 1))]
    pub worker_concurrency: usize,
    /// Job records kept for polling after completion
    pub history_limit: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            worker_concurrency: 1,
            history_limit: 200,
        }
    }
}

impl Config {
    /// Load from defaults, `config.{yaml,toml,json}` in the working directory and the environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Load with an explicit config file path
    pub fn load_from(path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(p) => config::File::with_name(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{addr}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationErrors;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.terminology.bridge(), Some("http://id.who.int/icd/release/11/mms/tm2"));
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn blank_bridge_disables_bridging() {
        let mut config = Config::default();
        config.terminology.bridge_system = Some("  ".to_string());
        assert_eq!(config.terminology.bridge(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_bridge_and_bad_ranges() {
        let mut config = Config::default();
        config.terminology.bridge_system = Some("http://example.org/other".to_string());
        let result = config.validate();
        assert!(ValidationErrors::has_error(&result, "terminology"));
        assert!(config.terminology.validate().is_err());

        let mut config = Config::default();
        config.terminology.generated_confidence = 1.5;
        assert!(ValidationErrors::has_error(
            &config.terminology.validate(),
            "generated_confidence"
        ));

        let mut config = Config::default();
        config.terminology.default_page_size = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.terminology.tm2_system = "not a uri".to_string();
        assert!(ValidationErrors::has_error(&config.terminology.validate(), "tm2_system"));
    }

    #[test]
    fn sizes_ports_and_ratios_have_lower_bounds() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(ValidationErrors::has_error(&config.server.validate(), "port"));

        let mut config = Config::default();
        config.jobs.worker_concurrency = 0;
        assert!(ValidationErrors::has_error(&config.validate(), "jobs"));

        let mut config = Config::default();
        config.logging.trace_sample_ratio = -0.1;
        assert!(ValidationErrors::has_error(&config.logging.validate(), "trace_sample_ratio"));
    }

    #[test]
    fn who_api_requires_credentials() {
        let mut config = Config::default();
        config.who_api.enabled = true;
        assert!(ValidationErrors::has_error(&config.validate(), "who_api"));
        config.who_api.client_id = Some("id".to_string());
        config.who_api.client_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }
}
