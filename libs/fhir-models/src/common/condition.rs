//! FHIR Condition model

use super::datatypes::{Annotation, CodeableConcept, Reference};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONDITION_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VER_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const CONDITION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-category";

/// FHIR Condition resource
///
/// A clinical condition, problem, diagnosis, or other event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Resource type - always "Condition"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// active | recurrence | relapse | inactive | remission | resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    /// unconfirmed | provisional | differential | confirmed | refuted | entered-in-error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,

    /// problem-list-item | encounter-diagnosis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    /// Identification of the condition, problem or diagnosis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    /// Who has the condition?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    /// Estimated or actual date or date-time the condition began
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,

    /// Date record was first recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,

    /// Additional information about the Condition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,

    /// Elements not modelled above
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

fn default_resource_type() -> String {
    "Condition".to_string()
}

impl Condition {
    pub fn new() -> Self {
        Self {
            resource_type: "Condition".to_string(),
            ..Default::default()
        }
    }

    /// Patient id from a `Patient/{id}` subject reference
    pub fn patient_id(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .and_then(|s| s.reference.as_deref())
            .and_then(|r| r.strip_prefix("Patient/"))
    }
}
