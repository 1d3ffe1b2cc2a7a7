//! FHIR CodeSystem model

use super::datatypes::PublicationStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// FHIR CodeSystem resource
///
/// Declares the existence of and describes a code system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystem {
    /// Resource type - always "CodeSystem"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Canonical identifier
    pub url: String,

    /// Business version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Name (computer friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name (human friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication status
    pub status: PublicationStatus,

    /// For testing purposes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<bool>,

    /// Date last changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Name of the publisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// If code comparison is case sensitive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    /// Canonical reference to the value set with all codes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,

    /// Content type (not-present | example | fragment | complete | supplement)
    pub content: CodeSystemContentMode,

    /// Total concepts in the code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Property definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property: Vec<CodeSystemProperty>,

    /// Concepts in the code system
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concept: Vec<CodeSystemConcept>,

    /// Elements not modelled above
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

fn default_resource_type() -> String {
    "CodeSystem".to_string()
}

/// Content mode for a code system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeSystemContentMode {
    NotPresent,
    Example,
    Fragment,
    Complete,
    Supplement,
}

/// Property definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeSystemProperty {
    /// Identifies the property
    pub code: String,

    /// Formal identifier for the property
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Description of the property
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Type of property (code | Coding | string | integer | boolean | dateTime | decimal)
    #[serde(rename = "type")]
    pub property_type: String,
}

impl CodeSystemProperty {
    pub fn new(
        code: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            uri: None,
            description: Some(description.into()),
            property_type: property_type.into(),
        }
    }
}

/// Concept in the code system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeSystemConcept {
    /// Code that identifies the concept
    pub code: String,

    /// Text to display to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Formal definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Property values for the concept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property: Vec<CodeSystemConceptProperty>,
}

/// Property value for a concept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemConceptProperty {
    /// Reference to property definition
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

impl CodeSystemConceptProperty {
    pub fn code(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value_code: Some(value.into()),
            value_string: None,
        }
    }

    pub fn string(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value_code: None,
            value_string: Some(value.into()),
        }
    }
}

impl CodeSystem {
    /// Create a new CodeSystem with minimal required fields
    pub fn new(
        url: impl Into<String>,
        status: PublicationStatus,
        content: CodeSystemContentMode,
    ) -> Self {
        Self {
            resource_type: "CodeSystem".to_string(),
            id: None,
            url: url.into(),
            version: None,
            name: None,
            title: None,
            status,
            experimental: None,
            date: None,
            publisher: None,
            description: None,
            case_sensitive: None,
            value_set: None,
            content,
            count: None,
            property: Vec::new(),
            concept: Vec::new(),
            extensions: Map::new(),
        }
    }

    /// Find a concept by code
    pub fn find_concept(&self, code: &str) -> Option<&CodeSystemConcept> {
        self.concept.iter().find(|c| c.code == code)
    }
}
