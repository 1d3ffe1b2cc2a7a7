//! FHIR CapabilityStatement model

use super::datatypes::PublicationStatus;
use serde::{Deserialize, Serialize};

/// FHIR CapabilityStatement resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    /// Resource type - always "CapabilityStatement"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub status: PublicationStatus,

    pub date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// instance | capability | requirements
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<CapabilitySoftware>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<CapabilityImplementation>,

    /// FHIR Version the system supports
    pub fhir_version: String,

    /// formats supported (xml | json | ttl | mime type)
    pub format: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rest: Vec<CapabilityRest>,
}

fn default_resource_type() -> String {
    "CapabilityStatement".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilitySoftware {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityImplementation {
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityRest {
    /// client | server
    pub mode: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<CapabilityResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation: Vec<CapabilityOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interaction: Vec<CapabilityInteraction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_param: Vec<CapabilitySearchParam>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation: Vec<CapabilityOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityInteraction {
    /// read | vread | update | patch | delete | history-instance | history-type | create | search-type
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilitySearchParam {
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityOperation {
    pub name: String,

    /// Canonical OperationDefinition
    pub definition: String,
}

impl CapabilityResource {
    pub fn new(resource_type: impl Into<String>, interactions: &[&str]) -> Self {
        Self {
            resource_type: resource_type.into(),
            profile: None,
            interaction: interactions
                .iter()
                .map(|code| CapabilityInteraction {
                    code: (*code).to_string(),
                })
                .collect(),
            search_param: Vec::new(),
            operation: Vec::new(),
        }
    }

    pub fn with_operation(mut self, name: &str, definition: &str) -> Self {
        self.operation.push(CapabilityOperation {
            name: name.to_string(),
            definition: definition.to_string(),
        });
        self
    }

    pub fn with_search_param(mut self, name: &str, param_type: &str, documentation: &str) -> Self {
        self.search_param.push(CapabilitySearchParam {
            name: name.to_string(),
            param_type: param_type.to_string(),
            documentation: Some(documentation.to_string()),
        });
        self
    }
}
