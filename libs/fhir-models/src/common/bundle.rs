//! FHIR Bundle model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// FHIR Bundle resource
///
/// A container for a collection of resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Resource type - always "Bundle"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id of this artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Indicates the purpose of this bundle - how it was intended to be used
    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    /// When the bundle was assembled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// If search, the total number of matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    /// Entry in the bundle - will have a resource or information
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,

    /// Elements not modelled above
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

fn default_resource_type() -> String {
    "Bundle".to_string()
}

/// Type of Bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    History,
    Searchset,
    Collection,
}

/// Entry in the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// Full URL for the entry (relative to the base URL, or absolute)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    /// A resource in this bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,

    /// Elements not modelled above (request, response, search)
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl BundleEntry {
    pub fn resource(full_url: Option<String>, resource: Value) -> Self {
        Self {
            full_url,
            resource: Some(resource),
            extensions: Map::new(),
        }
    }

    /// `resourceType` of the entry's resource
    pub fn resource_type(&self) -> Option<&str> {
        self.resource
            .as_ref()
            .and_then(|r| r.get("resourceType"))
            .and_then(Value::as_str)
    }
}

impl Bundle {
    /// Create a new Bundle with minimal required fields
    pub fn new(bundle_type: BundleType) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id: None,
            bundle_type,
            timestamp: None,
            total: None,
            entry: Vec::new(),
            extensions: Map::new(),
        }
    }

    /// Get the number of entries in the bundle
    pub fn entry_count(&self) -> usize {
        self.entry.len()
    }

    /// Add an entry to the bundle
    pub fn add_entry(&mut self, entry: BundleEntry) {
        self.entry.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_keeps_unmodelled_entry_elements() {
        let bundle: Bundle = serde_json::from_value(json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [{
                "fullUrl": "urn:uuid:1",
                "resource": { "resourceType": "Patient", "id": "p1" },
                "request": { "method": "POST", "url": "Patient" }
            }]
        }))
        .unwrap();

        assert_eq!(bundle.bundle_type, BundleType::Transaction);
        assert_eq!(bundle.entry_count(), 1);
        assert_eq!(bundle.entry[0].resource_type(), Some("Patient"));
        assert_eq!(bundle.entry[0].extensions["request"]["method"], "POST");
    }

    #[test]
    fn serialize_kebab_case_bundle_type() {
        let bundle = Bundle::new(BundleType::BatchResponse);
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["type"], "batch-response");
        assert!(value.get("entry").is_none());
    }
}
