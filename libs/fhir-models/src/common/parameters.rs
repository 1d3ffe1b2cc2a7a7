//! FHIR Parameters model
//!
//! Operation inputs and outputs. A parameter carries either one `value[x]`,
//! an inline `resource`, or nested `part`s.

use super::datatypes::Coding;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// FHIR Parameters resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// Resource type - always "Parameters"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Operation Parameter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,
}

fn default_resource_type() -> String {
    "Parameters".to_string()
}

/// A single named parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    /// Name from the definition
    pub name: String,

    /// The `value[x]` entry, keyed by its typed name (`valueString`, `valueCoding`, ...)
    #[serde(flatten)]
    pub value: Map<String, Value>,

    /// If parameter is a whole resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,

    /// Named part of a multi-part parameter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part: Vec<Parameter>,
}

impl Parameter {
    pub fn value(name: impl Into<String>, key: &str, value: Value) -> Self {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        Self {
            name: name.into(),
            value: map,
            resource: None,
            part: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::value(name, "valueString", Value::String(value.into()))
    }

    pub fn code(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::value(name, "valueCode", Value::String(value.into()))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::value(name, "valueBoolean", Value::Bool(value))
    }

    pub fn coding(name: impl Into<String>, coding: &Coding) -> Self {
        let value = serde_json::to_value(coding).unwrap_or(Value::Null);
        Self::value(name, "valueCoding", value)
    }

    pub fn parts(name: impl Into<String>, part: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            value: Map::new(),
            resource: None,
            part,
        }
    }

    /// The `value[x]` payload regardless of its type suffix
    pub fn any_value(&self) -> Option<&Value> {
        self.value
            .iter()
            .find(|(k, _)| k.starts_with("value"))
            .map(|(_, v)| v)
    }

    /// Find a named part
    pub fn get_part(&self, name: &str) -> Option<&Parameter> {
        self.part.iter().find(|p| p.name == name)
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self {
            resource_type: "Parameters".to_string(),
            id: None,
            parameter: Vec::new(),
        }
    }

    pub fn push(&mut self, parameter: Parameter) {
        self.parameter.push(parameter);
    }

    pub fn add_value_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(Parameter::string(name, value));
    }

    pub fn add_value_code(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(Parameter::code(name, value));
    }

    pub fn add_value_boolean(&mut self, name: impl Into<String>, value: bool) {
        self.push(Parameter::boolean(name, value));
    }

    pub fn add_value_coding(&mut self, name: impl Into<String>, coding: &Coding) {
        self.push(Parameter::coding(name, coding));
    }

    pub fn add_parts(&mut self, name: impl Into<String>, parts: Vec<Parameter>) {
        self.push(Parameter::parts(name, parts));
    }

    /// First parameter with the given name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameter.iter().find(|p| p.name == name)
    }

    /// All parameters with the given name
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameter.iter().filter(move |p| p.name == name)
    }

    /// `value[x]` of the first parameter with the given name
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Parameter::any_value)
    }

    /// String-valued parameter (string, code, uri, canonical ...)
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_value(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_value(name).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_entries_serialize_under_their_typed_key() {
        let mut params = Parameters::new();
        params.add_value_boolean("result", true);
        params.add_parts(
            "match",
            vec![
                Parameter::code("equivalence", "equivalent"),
                Parameter::coding(
                    "concept",
                    &Coding::new("http://id.who.int/icd/release/11/mms/tm2", "SP90"),
                ),
            ],
        );

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({
                "resourceType": "Parameters",
                "parameter": [
                    { "name": "result", "valueBoolean": true },
                    { "name": "match", "part": [
                        { "name": "equivalence", "valueCode": "equivalent" },
                        { "name": "concept", "valueCoding": {
                            "system": "http://id.who.int/icd/release/11/mms/tm2",
                            "code": "SP90"
                        }}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn typed_lookups_ignore_value_suffix() {
        let params: Parameters = serde_json::from_value(json!({
            "resourceType": "Parameters",
            "parameter": [
                { "name": "code", "valueCode": "AAE-16" },
                { "name": "system", "valueUri": "https://ayush.gov.in/fhir/CodeSystem/namaste" },
                { "name": "reverse", "valueBoolean": false }
            ]
        }))
        .unwrap();

        assert_eq!(params.get_str("code"), Some("AAE-16"));
        assert_eq!(
            params.get_str("system"),
            Some("https://ayush.gov.in/fhir/CodeSystem/namaste")
        );
        assert_eq!(params.get_bool("reverse"), Some(false));
        assert!(params.get("targetsystem").is_none());
    }
}
