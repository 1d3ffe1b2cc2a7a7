//! Translation Resolver output

use super::mapping::{ConceptMapping, Equivalence, MappingOrigin};
use serde::{Deserialize, Serialize};

/// Intermediate code of a transitive translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeHop {
    pub system: String,
    pub code: String,
    pub first_mapping_id: i64,
    pub second_mapping_id: i64,
}

/// One candidate target of a translation, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMatch {
    /// Id of the stored mapping; absent for transitive matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub source_system: String,
    pub source_code: String,
    pub target_system: String,
    pub target_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_display: Option<String>,
    pub equivalence: Equivalence,
    pub confidence_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<MappingOrigin>,
    /// Set when the match was reached through the bridge vocabulary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<BridgeHop>,
    /// True when the match was read from a mapping stored in the opposite direction
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reversed: bool,
}

impl TranslationMatch {
    /// Match read straight from a stored edge
    pub fn direct(mapping: &ConceptMapping, target_display: Option<String>) -> Self {
        Self {
            id: Some(mapping.id),
            source_system: mapping.source_system.clone(),
            source_code: mapping.source_code.clone(),
            target_system: mapping.target_system.clone(),
            target_code: mapping.target_code.clone(),
            target_display,
            equivalence: mapping.equivalence,
            confidence_score: mapping.confidence_score,
            comment: mapping.comment.clone(),
            mapping_version: Some(mapping.mapping_version.clone()),
            origin: Some(mapping.origin),
            via: None,
            reversed: false,
        }
    }

    /// Match read from an edge stored target -> source
    pub fn inverted(mapping: &ConceptMapping, target_display: Option<String>) -> Self {
        Self {
            id: Some(mapping.id),
            source_system: mapping.target_system.clone(),
            source_code: mapping.target_code.clone(),
            target_system: mapping.source_system.clone(),
            target_code: mapping.source_code.clone(),
            target_display,
            equivalence: mapping.equivalence.inverse(),
            confidence_score: mapping.confidence_score,
            comment: mapping.comment.clone(),
            mapping_version: Some(mapping.mapping_version.clone()),
            origin: Some(mapping.origin),
            via: None,
            reversed: true,
        }
    }
}
