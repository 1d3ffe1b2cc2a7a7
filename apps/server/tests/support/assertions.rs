use anyhow::Context as _;
use axum::http::StatusCode;
use serde_json::Value;

/// Assert status code matches expected
pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected status {expected}, got {actual}"
    );
}

/// Assert that a response is a FHIR resource of the given type
pub fn assert_resource_type(value: &Value, resource_type: &str) {
    assert_eq!(
        value.get("resourceType").and_then(|v| v.as_str()),
        Some(resource_type),
        "expected {resource_type} resource type"
    );
}

/// Assert that a Bundle has a specific type
pub fn assert_bundle_type<'a>(bundle: &'a Value, bundle_type: &str) -> anyhow::Result<&'a Value> {
    assert_resource_type(bundle, "Bundle");
    assert_eq!(
        bundle.get("type").and_then(|v| v.as_str()),
        Some(bundle_type),
        "expected Bundle.type = {bundle_type}"
    );
    Ok(bundle)
}

/// Get Bundle entries as array
pub fn get_bundle_entries(bundle: &Value) -> anyhow::Result<&Vec<Value>> {
    bundle
        .get("entry")
        .and_then(|v| v.as_array())
        .context("Bundle.entry is array")
}

/// Assert that the body is an error OperationOutcome with the given issue code
pub fn assert_outcome(outcome: &Value, expected_code: &str) -> anyhow::Result<()> {
    assert_resource_type(outcome, "OperationOutcome");
    let issue = outcome
        .get("issue")
        .and_then(|v| v.as_array())
        .and_then(|issues| issues.first())
        .context("OperationOutcome.issue[0]")?;
    assert_eq!(issue["severity"], "error");
    assert_eq!(issue["code"], expected_code, "issue: {issue}");
    Ok(())
}

/// All `Parameters.parameter` entries named `name`
pub fn params_named<'a>(parameters: &'a Value, name: &str) -> Vec<&'a Value> {
    parameters
        .get("parameter")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter(|p| p["name"] == name).collect())
        .unwrap_or_default()
}

/// First `Parameters.parameter` named `name`
pub fn param<'a>(parameters: &'a Value, name: &str) -> anyhow::Result<&'a Value> {
    params_named(parameters, name)
        .into_iter()
        .next()
        .with_context(|| format!("parameter {name}"))
}

/// Named part of a parameter with parts
pub fn part<'a>(parameter: &'a Value, name: &str) -> anyhow::Result<&'a Value> {
    parameter
        .get("part")
        .and_then(|v| v.as_array())
        .and_then(|parts| parts.iter().find(|p| p["name"] == name))
        .with_context(|| format!("part {name}"))
}

/// Codes of every coding in `CodeableConcept.coding`, in order
pub fn coding_codes(concept: &Value) -> Vec<String> {
    concept
        .get("coding")
        .and_then(|v| v.as_array())
        .map(|codings| {
            codings
                .iter()
                .filter_map(|c| c.get("code").and_then(|v| v.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_parameters_and_parts() {
        let parameters = json!({
            "resourceType": "Parameters",
            "parameter": [
                { "name": "result", "valueBoolean": true },
                { "name": "match", "part": [
                    { "name": "equivalence", "valueCode": "equivalent" }
                ]}
            ]
        });

        assert_eq!(param(&parameters, "result").unwrap()["valueBoolean"], true);
        let matched = param(&parameters, "match").unwrap();
        assert_eq!(part(matched, "equivalence").unwrap()["valueCode"], "equivalent");
        assert!(param(&parameters, "message").is_err());
    }
}
