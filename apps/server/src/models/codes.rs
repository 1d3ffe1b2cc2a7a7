//! Code Registry records: NAMASTE and ICD-11 codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Traditional medicine system a NAMASTE code belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TraditionalSystem {
    Ayurveda,
    Siddha,
    Unani,
}

impl TraditionalSystem {
    pub const ALL: [TraditionalSystem; 3] = [
        TraditionalSystem::Ayurveda,
        TraditionalSystem::Siddha,
        TraditionalSystem::Unani,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TraditionalSystem::Ayurveda => "AYURVEDA",
            TraditionalSystem::Siddha => "SIDDHA",
            TraditionalSystem::Unani => "UNANI",
        }
    }

    /// Case-insensitive parse
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AYURVEDA" => Some(TraditionalSystem::Ayurveda),
            "SIDDHA" => Some(TraditionalSystem::Siddha),
            "UNANI" => Some(TraditionalSystem::Unani),
            _ => None,
        }
    }
}

impl fmt::Display for TraditionalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition of ICD-11 used as a translation target
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Icd11CodeType {
    Tm2,
    Biomedicine,
}

impl Icd11CodeType {
    pub const ALL: [Icd11CodeType; 2] = [Icd11CodeType::Tm2, Icd11CodeType::Biomedicine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Icd11CodeType::Tm2 => "TM2",
            Icd11CodeType::Biomedicine => "BIOMEDICINE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TM2" => Some(Icd11CodeType::Tm2),
            "BIOMEDICINE" | "MMS" => Some(Icd11CodeType::Biomedicine),
            _ => None,
        }
    }
}

impl fmt::Display for Icd11CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A NAMASTE code as returned to callers.
///
/// `icd11Tm2Code` and `icd11BiomedicineCode` are filled from the derived
/// shortcut table at read time and are never written by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamasteCode {
    pub id: i64,
    pub code: String,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub system: TraditionalSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who_terminology_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icd11_tm2_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icd11_biomedicine_code: Option<String>,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Crosswalk columns supplied by ingestion. Input to mapping generation only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosswalkHints {
    pub icd11_tm2_code: Option<String>,
    pub icd11_biomedicine_code: Option<String>,
}

impl CrosswalkHints {
    pub fn is_empty(&self) -> bool {
        self.icd11_tm2_code.is_none() && self.icd11_biomedicine_code.is_none()
    }
}

/// Upsert payload for a NAMASTE code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNamasteCode {
    pub code: String,
    pub display: String,
    pub definition: Option<String>,
    pub system: Option<TraditionalSystem>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub who_terminology_code: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub hints: CrosswalkHints,
}

/// An ICD-11 code from either the TM2 or the biomedicine linearization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icd11Code {
    pub id: i64,
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub code_type: Icd11CodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub synonyms: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foundation_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linearization_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for an ICD-11 code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIcd11Code {
    pub code: String,
    pub title: String,
    pub definition: Option<String>,
    pub code_type: Icd11CodeType,
    pub parent: Option<String>,
    pub chapter: Option<String>,
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
    pub foundation_uri: Option<String>,
    pub linearization_uri: Option<String>,
}

impl NewIcd11Code {
    pub fn new(code_type: Icd11CodeType, code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            definition: None,
            code_type,
            parent: None,
            chapter: None,
            synonyms: BTreeMap::new(),
            foundation_uri: None,
            linearization_uri: None,
        }
    }
}

impl NewNamasteCode {
    pub fn new(
        system: TraditionalSystem,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            display: display.into(),
            system: Some(system),
            ..Default::default()
        }
    }
}

/// Either vocabulary, as seen by search and the FHIR builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vocabulary {
    Namaste,
    Icd11(Icd11CodeType),
}
