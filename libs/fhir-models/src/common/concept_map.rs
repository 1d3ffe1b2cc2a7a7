//! FHIR ConceptMap model (R4)

use super::datatypes::PublicationStatus;
use serde::{Deserialize, Serialize};

/// FHIR ConceptMap resource
///
/// A statement of relationships from one set of concepts to one or more other concepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMap {
    /// Resource type - always "ConceptMap"
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

    /// Date last changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Name of the publisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The source value set that contains the concepts being mapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,

    /// The target value set which provides context for the mappings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_uri: Option<String>,

    /// Same source and target systems
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<ConceptMapGroup>,
}

fn default_resource_type() -> String {
    "ConceptMap".to_string()
}

/// Mappings for one (source system, target system) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMapGroup {
    /// Source system where concepts to be mapped are defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Target system that the concepts are to be mapped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Mappings for a concept from the source set
    #[serde(default)]
    pub element: Vec<ConceptMapElement>,
}

/// Mappings for a single source concept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptMapElement {
    /// Identifies element being mapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Display for the code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Concept in target system for element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<ConceptMapTarget>,
}

/// One target of a mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptMapTarget {
    /// Code that identifies the target element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Display for the code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// relatedto | equivalent | equal | wider | subsumes | narrower | specializes | inexact | unmatched | disjoint
    pub equivalence: String,

    /// Description of status/issues in mapping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ConceptMap {
    pub fn new(url: impl Into<String>, status: PublicationStatus) -> Self {
        Self {
            resource_type: "ConceptMap".to_string(),
            id: None,
            url: url.into(),
            version: None,
            name: None,
            title: None,
            status,
            date: None,
            publisher: None,
            description: None,
            source_uri: None,
            target_uri: None,
            group: Vec::new(),
        }
    }

    /// Total number of targets across all groups
    pub fn target_count(&self) -> usize {
        self.group
            .iter()
            .flat_map(|g| g.element.iter())
            .map(|e| e.target.len())
            .sum()
    }
}
