//! FHIR R4 models used by the terminology server
//!
//! Only the elements the server reads or emits are typed; unknown elements on
//! inbound resources are preserved in `extensions`.

pub mod bundle;
pub mod capability_statement;
pub mod code_system;
pub mod concept_map;
pub mod condition;
pub mod datatypes;
pub mod error;
pub mod operation_outcome;
pub mod parameters;
pub mod value_set;

// Re-export commonly used types
pub use bundle::*;
pub use capability_statement::*;
pub use code_system::*;
pub use concept_map::*;
pub use condition::*;
pub use datatypes::*;
pub use error::{Error, Result};
pub use operation_outcome::*;
pub use parameters::*;
pub use value_set::*;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Common behaviour of typed resources.
pub trait Resource: Serialize + DeserializeOwned {
    const RESOURCE_TYPE: &'static str;

    /// Convert to a JSON value
    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    /// Parse from a JSON value, checking `resourceType` first
    fn from_value(value: &Value) -> Result<Self> {
        let actual = value
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidResource("missing resourceType".to_string()))?;
        if actual != Self::RESOURCE_TYPE {
            return Err(Error::ResourceTypeMismatch {
                expected: Self::RESOURCE_TYPE.to_string(),
                actual: actual.to_string(),
            });
        }
        serde_json::from_value(value.clone()).map_err(Error::from)
    }
}

macro_rules! impl_resource {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Resource for $ty {
                const RESOURCE_TYPE: &'static str = $name;
            }
        )*
    };
}

impl_resource! {
    Bundle => "Bundle",
    CapabilityStatement => "CapabilityStatement",
    CodeSystem => "CodeSystem",
    ConceptMap => "ConceptMap",
    Condition => "Condition",
    OperationOutcome => "OperationOutcome",
    Parameters => "Parameters",
    ValueSet => "ValueSet",
}
