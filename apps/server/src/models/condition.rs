//! Dual-coding request bodies

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref CLINICAL_STATUS: Regex =
        Regex::new(r"^(active|inactive|resolved)$").expect("valid clinical status pattern");
    static ref VERIFICATION_STATUS: Regex = Regex::new(
        r"^(provisional|differential|confirmed|refuted|entered-in-error|unknown)$"
    )
    .expect("valid verification status pattern");
    static ref ONSET_DATE: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid onset date pattern");
}

/// Body of `POST /fhir/Condition` and `POST /fhir/ProblemList/Condition`
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConditionRequest {
    #[validate(length(min = 1, message = "NAMASTE code is required"))]
    pub namaste_code: String,
    #[validate(length(min = 1, message = "Patient ID is required"))]
    pub patient_id: String,
    #[validate(regex(
        path = *CLINICAL_STATUS,
        message = "Clinical status must be active, inactive, or resolved"
    ))]
    pub clinical_status: Option<String>,
    #[validate(regex(
        path = *VERIFICATION_STATUS,
        message = "Verification status must be one of: provisional, differential, confirmed, refuted, entered-in-error, unknown"
    ))]
    pub verification_status: Option<String>,
    #[validate(regex(path = *ONSET_DATE, message = "Onset date must be in YYYY-MM-DD format"))]
    pub onset_date: Option<String>,
    pub notes: Option<String>,
}

impl CreateConditionRequest {
    pub fn new(namaste_code: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            namaste_code: namaste_code.into(),
            patient_id: patient_id.into(),
            ..Default::default()
        }
    }
}

/// Body of `POST /fhir/ProblemList/validate-coding`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCodingRequest {
    #[validate(length(min = 1, message = "namasteCode is required"))]
    pub namaste_code: String,
    #[validate(length(min = 1, message = "icd11Code is required"))]
    pub icd11_code: String,
    /// `TM2` selects the TM2 partition; anything else means biomedicine
    pub system: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_and_dates_are_checked() {
        let mut request = CreateConditionRequest::new("AAE-16", "p1");
        assert!(request.validate().is_ok());

        request.clinical_status = Some("remission".to_string());
        request.onset_date = Some("2024/01/05".to_string());
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("clinical_status"));
        assert!(fields.contains_key("onset_date"));

        request.clinical_status = Some("resolved".to_string());
        request.verification_status = Some("entered-in-error".to_string());
        request.onset_date = Some("2024-01-05".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_required_fields_fail() {
        let request = CreateConditionRequest::new("", "");
        assert_eq!(request.validate().unwrap_err().field_errors().len(), 2);
    }
}
