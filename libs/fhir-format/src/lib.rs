//! FHIR JSON ↔ XML conversion for terminology resources.
//!
//! Follows the HL7 FHIR XML mapping rules for the resources this server emits
//! and accepts:
//! - Root element uses the `resourceType` name in the FHIR namespace.
//! - Primitive values are encoded with the `value` attribute.
//! - Contained resources (`Bundle.entry.resource`, `Parameters.parameter.resource`)
//!   are wrapped in an element named after their own `resourceType`.
//! - Repeating elements are always read back as JSON arrays, even when the
//!   document holds a single occurrence.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use roxmltree::Document;
use serde_json::{Map, Number, Value};
use std::io::Cursor;
use thiserror::Error;

const FHIR_NS: &str = "http://hl7.org/fhir";
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Complex element names that are arrays in every resource this crate handles.
/// ConceptMap.group.target is a primitive uri and stays scalar.
const REPEATING_ELEMENTS: &[&str] = &[
    "coding",
    "category",
    "concept",
    "contains",
    "designation",
    "element",
    "entry",
    "extension",
    "filter",
    "group",
    "identifier",
    "include",
    "exclude",
    "issue",
    "link",
    "note",
    "operation",
    "parameter",
    "part",
    "property",
    "rest",
    "searchParam",
    "target",
    "interaction",
];

/// Primitive element names that repeat.
const REPEATING_PRIMITIVES: &[&str] = &["format"];

/// Element names whose `value` attribute is numeric.
const NUMERIC_ELEMENTS: &[&str] = &[
    "total",
    "count",
    "offset",
    "valueInteger",
    "valueDecimal",
    "valueUnsignedInt",
    "valuePositiveInt",
];

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected a JSON object for the resource")]
    ExpectedObject,
    #[error("missing resourceType property")]
    MissingResourceType,
    #[error("root element is not in the FHIR namespace")]
    WrongNamespace,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),
}

/// Serialisation format of a FHIR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// Parse the value of a `_format` parameter. Accepts the short names and
    /// the FHIR mime types.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let base = normalized.split(';').next().unwrap_or("").trim();
        match base {
            "json" | "application/json" | "application/fhir+json" => Some(Format::Json),
            "xml" | "text/xml" | "application/xml" | "application/fhir+xml" => Some(Format::Xml),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Json => "application/fhir+json",
            Format::Xml => "application/fhir+xml",
        }
    }
}

/// Render a resource value in the requested format.
pub fn render(value: &Value, format: Format, pretty: bool) -> Result<String, FormatError> {
    match format {
        Format::Json if pretty => Ok(serde_json::to_string_pretty(value)?),
        Format::Json => Ok(serde_json::to_string(value)?),
        Format::Xml => value_to_xml(value),
    }
}

/// Parse a payload in the given format into a JSON value.
pub fn parse(input: &str, format: Format) -> Result<Value, FormatError> {
    match format {
        Format::Json => Ok(serde_json::from_str(input)?),
        Format::Xml => xml_to_value(input),
    }
}

/// Convert a FHIR JSON payload into its XML representation.
pub fn json_to_xml(input: &str) -> Result<String, FormatError> {
    let value: Value = serde_json::from_str(input)?;
    value_to_xml(&value)
}

/// Convert a FHIR JSON value into its XML representation.
pub fn value_to_xml(value: &Value) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write_resource(&mut writer, value, true)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// Convert a FHIR XML payload into its JSON representation.
pub fn xml_to_json(input: &str) -> Result<String, FormatError> {
    let json = xml_to_value(input)?;
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Convert a FHIR XML payload into a JSON value.
pub fn xml_to_value(input: &str) -> Result<Value, FormatError> {
    let doc = Document::parse(input)?;
    let root = doc.root_element();
    if root.tag_name().namespace() != Some(FHIR_NS) {
        return Err(FormatError::WrongNamespace);
    }
    resource_from_element(input, &root)
}

fn write_resource(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    value: &Value,
    root: bool,
) -> Result<(), FormatError> {
    let obj = value.as_object().ok_or(FormatError::ExpectedObject)?;
    let resource_type = obj
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or(FormatError::MissingResourceType)?;

    let mut start = BytesStart::new(resource_type);
    if root {
        start.push_attribute(("xmlns", FHIR_NS));
    }
    writer.write_event(Event::Start(start))?;

    for (k, v) in obj {
        if k == "resourceType" || k.starts_with('_') {
            continue;
        }
        write_json_value(writer, k, v)?;
    }

    writer.write_event(Event::End(BytesEnd::new(resource_type)))?;
    Ok(())
}

fn write_json_value(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    value: &Value,
) -> Result<(), FormatError> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_json_value(writer, name, item)?;
            }
        }
        Value::Object(obj) if obj.contains_key("resourceType") => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            write_resource(writer, value, false)?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Value::Object(obj) => write_complex(writer, name, obj)?,
        Value::Null => {}
        primitive => {
            let mut elem = BytesStart::new(name);
            elem.push_attribute(("value", primitive_to_string(primitive).as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
    }
    Ok(())
}

fn write_complex(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    obj: &Map<String, Value>,
) -> Result<(), FormatError> {
    let mut start = BytesStart::new(name);
    if let Some(Value::String(id)) = obj.get("id") {
        start.push_attribute(("id", id.as_str()));
    }

    let has_children = obj
        .iter()
        .any(|(k, v)| k != "id" && !k.starts_with('_') && !v.is_null());
    if !has_children {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for (k, v) in obj {
        if k.starts_with('_') || k == "id" {
            continue;
        }
        write_json_value(writer, k, v)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn primitive_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn resource_from_element(source: &str, node: &roxmltree::Node) -> Result<Value, FormatError> {
    let mut map = Map::new();
    map.insert(
        "resourceType".to_string(),
        Value::String(node.tag_name().name().to_string()),
    );
    for child in node.children().filter(|n| n.is_element()) {
        let name = child.tag_name().name();
        let value = element_to_value(source, &child)?;
        insert_property(&mut map, name, value);
    }
    Ok(Value::Object(map))
}

fn element_to_value(source: &str, node: &roxmltree::Node) -> Result<Value, FormatError> {
    if node.tag_name().namespace() == Some(XHTML_NS) {
        return Ok(Value::String(source[node.range()].to_string()));
    }

    let name = node.tag_name().name();
    if let Some(raw) = node.attribute("value") {
        return Ok(parse_primitive(name, raw));
    }

    // <resource><Condition>...</Condition></resource>
    if name == "resource" {
        if let Some(inner) = node.children().find(|c| c.is_element()) {
            return resource_from_element(source, &inner);
        }
    }

    let mut obj = Map::new();
    if let Some(id) = node.attribute("id") {
        obj.insert("id".to_string(), Value::String(id.to_string()));
    }
    for child in node.children().filter(|c| c.is_element()) {
        let value = element_to_value(source, &child)?;
        insert_property(&mut obj, child.tag_name().name(), value);
    }
    Ok(Value::Object(obj))
}

fn insert_property(map: &mut Map<String, Value>, name: &str, value: Value) {
    let repeating = if value.is_object() {
        REPEATING_ELEMENTS.contains(&name)
    } else {
        REPEATING_PRIMITIVES.contains(&name)
    };
    match map.get_mut(name) {
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None if repeating => {
            map.insert(name.to_string(), Value::Array(vec![value]));
        }
        None => {
            map.insert(name.to_string(), value);
        }
    }
}

fn parse_primitive(name: &str, raw: &str) -> Value {
    if name == "valueBoolean" || raw == "true" || raw == "false" {
        if let Ok(b) = raw.parse::<bool>() {
            return Value::Bool(b);
        }
    }
    if NUMERIC_ELEMENTS.contains(&name) {
        if let Ok(int) = raw.parse::<i64>() {
            return Value::Number(int.into());
        }
        if let Some(num) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}
