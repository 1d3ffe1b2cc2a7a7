//! FHIR OperationOutcome model

use serde::{Deserialize, Serialize};

/// FHIR OperationOutcome resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    /// Resource type - always "OperationOutcome"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// A single issue associated with the action
    pub issue: Vec<OperationOutcomeIssue>,
}

fn default_resource_type() -> String {
    "OperationOutcome".to_string()
}

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,

    /// Error or warning code (invalid | not-found | conflict | processing | exception | ...)
    pub code: String,

    /// Additional diagnostic information about the issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,

    /// FHIRPath of element(s) related to issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression: Vec<String>,
}

impl OperationOutcome {
    /// Outcome with a single issue
    pub fn single(
        severity: IssueSeverity,
        code: impl Into<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            id: None,
            issue: vec![OperationOutcomeIssue {
                severity,
                code: code.into(),
                diagnostics: Some(diagnostics.into()),
                expression: Vec::new(),
            }],
        }
    }

    pub fn error(code: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::single(IssueSeverity::Error, code, diagnostics)
    }

    pub fn information(diagnostics: impl Into<String>) -> Self {
        Self::single(IssueSeverity::Information, "informational", diagnostics)
    }

    pub fn has_errors(&self) -> bool {
        self.issue
            .iter()
            .any(|i| matches!(i.severity, IssueSeverity::Error | IssueSeverity::Fatal))
    }
}
