//! FHIR data models for the AYUSH terminology server
//!
//! Strongly-typed R4 structures for the terminology resources the server
//! renders (CodeSystem, ConceptMap, ValueSet, Parameters, OperationOutcome,
//! CapabilityStatement) and the clinical resources it accepts (Condition, Bundle).
//!
//! # Example
//!
//! ```rust
//! use ayush_fhir_models::common::{Coding, Condition, Resource};
//! use serde_json::json;
//!
//! let condition = Condition::from_value(&json!({
//!     "resourceType": "Condition",
//!     "code": { "coding": [{
//!         "system": "https://ayush.gov.in/fhir/CodeSystem/namaste",
//!         "code": "AAE-16"
//!     }]},
//!     "subject": { "reference": "Patient/p1" }
//! }))
//! .unwrap();
//!
//! assert_eq!(condition.patient_id(), Some("p1"));
//! let code = condition.code.unwrap();
//! assert_eq!(code.coding[0], Coding::new("https://ayush.gov.in/fhir/CodeSystem/namaste", "AAE-16"));
//! ```

pub mod common;

// Re-export commonly used types
pub use common::*;
