//! Mapping Graph edges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// How precisely a source concept corresponds to a target concept (FHIR R4 ConceptMapEquivalence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Equivalence {
    #[serde(alias = "relatedto")]
    RelatedTo,
    #[serde(alias = "equivalent")]
    Equivalent,
    #[serde(alias = "equal")]
    Equal,
    #[serde(alias = "wider")]
    Wider,
    #[serde(alias = "subsumes")]
    Subsumes,
    #[serde(alias = "narrower")]
    Narrower,
    #[serde(alias = "specializes")]
    Specializes,
    #[serde(alias = "inexact")]
    Inexact,
    #[serde(alias = "unmatched")]
    Unmatched,
    #[serde(alias = "disjoint")]
    Disjoint,
}

impl Equivalence {
    /// Tie-break rank for edges with equal confidence. Higher is stronger.
    pub fn rank(&self) -> u8 {
        match self {
            Equivalence::Equal => 6,
            Equivalence::Equivalent => 5,
            Equivalence::Subsumes | Equivalence::Specializes => 4,
            Equivalence::Wider | Equivalence::Narrower => 3,
            Equivalence::RelatedTo => 2,
            Equivalence::Inexact => 1,
            Equivalence::Unmatched | Equivalence::Disjoint => 0,
        }
    }

    /// UNMATCHED and DISJOINT carry no usable target.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Equivalence::Unmatched | Equivalence::Disjoint)
    }

    /// Lower-case code used in FHIR resources
    pub fn fhir_code(&self) -> &'static str {
        match self {
            Equivalence::RelatedTo => "relatedto",
            Equivalence::Equivalent => "equivalent",
            Equivalence::Equal => "equal",
            Equivalence::Wider => "wider",
            Equivalence::Subsumes => "subsumes",
            Equivalence::Narrower => "narrower",
            Equivalence::Specializes => "specializes",
            Equivalence::Inexact => "inexact",
            Equivalence::Unmatched => "unmatched",
            Equivalence::Disjoint => "disjoint",
        }
    }

    /// Equivalence read from target to source
    pub fn inverse(&self) -> Self {
        match self {
            Equivalence::Wider => Equivalence::Narrower,
            Equivalence::Narrower => Equivalence::Wider,
            Equivalence::Subsumes => Equivalence::Specializes,
            Equivalence::Specializes => Equivalence::Subsumes,
            other => *other,
        }
    }

    /// The weaker of two equivalences, used for chained translations
    pub fn weaker(self, other: Self) -> Self {
        if other.rank() < self.rank() {
            other
        } else {
            self
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "relatedto" => Some(Equivalence::RelatedTo),
            "equivalent" => Some(Equivalence::Equivalent),
            "equal" => Some(Equivalence::Equal),
            "wider" => Some(Equivalence::Wider),
            "subsumes" => Some(Equivalence::Subsumes),
            "narrower" => Some(Equivalence::Narrower),
            "specializes" => Some(Equivalence::Specializes),
            "inexact" => Some(Equivalence::Inexact),
            "unmatched" => Some(Equivalence::Unmatched),
            "disjoint" => Some(Equivalence::Disjoint),
            _ => None,
        }
    }
}

impl fmt::Display for Equivalence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fhir_code().to_ascii_uppercase())
    }
}

/// Whether a mapping was curated by a person or produced by the generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MappingOrigin {
    Manual,
    Generated,
}

impl MappingOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingOrigin::Manual => "manual",
            MappingOrigin::Generated => "generated",
        }
    }
}

/// Natural key of a mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingKey {
    pub source_system: String,
    pub source_code: String,
    pub target_system: String,
    pub target_code: String,
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{} -> {}|{}",
            self.source_system, self.source_code, self.target_system, self.target_code
        )
    }
}

/// An edge of the Mapping Graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMapping {
    pub id: i64,
    pub source_system: String,
    pub source_code: String,
    pub target_system: String,
    pub target_code: String,
    pub equivalence: Equivalence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub confidence_score: f64,
    pub mapping_version: String,
    pub origin: MappingOrigin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConceptMapping {
    pub fn key(&self) -> MappingKey {
        MappingKey {
            source_system: self.source_system.clone(),
            source_code: self.source_code.clone(),
            target_system: self.target_system.clone(),
            target_code: self.target_code.clone(),
        }
    }
}

/// Validated input to `add_or_update_mapping`
#[derive(Debug, Clone, PartialEq)]
pub struct MappingDraft {
    pub key: MappingKey,
    pub equivalence: Equivalence,
    pub comment: Option<String>,
    pub confidence_score: f64,
    pub mapping_version: Option<String>,
    pub origin: MappingOrigin,
}

/// Body of `POST /terminology/mapping`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMappingRequest {
    #[validate(length(min = 1, message = "sourceCode is required"))]
    pub source_code: String,
    #[validate(length(min = 1, message = "sourceSystem is required"))]
    pub source_system: String,
    #[validate(length(min = 1, message = "targetCode is required"))]
    pub target_code: String,
    #[validate(length(min = 1, message = "targetSystem is required"))]
    pub target_system: String,
    pub equivalence: Equivalence,
    pub comment: Option<String>,
    pub confidence_score: Option<f64>,
    pub mapping_version: Option<String>,
}

impl CreateMappingRequest {
    /// Manual mappings default to full confidence
    pub fn into_draft(self) -> MappingDraft {
        MappingDraft {
            key: MappingKey {
                source_system: self.source_system.trim().to_string(),
                source_code: self.source_code.trim().to_string(),
                target_system: self.target_system.trim().to_string(),
                target_code: self.target_code.trim().to_string(),
            },
            equivalence: self.equivalence,
            comment: self.comment.filter(|c| !c.trim().is_empty()),
            confidence_score: self.confidence_score.unwrap_or(1.0),
            mapping_version: self.mapping_version,
            origin: MappingOrigin::Manual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_orders_equal_above_equivalent_above_directional() {
        assert!(Equivalence::Equal.rank() > Equivalence::Equivalent.rank());
        assert!(Equivalence::Equivalent.rank() > Equivalence::Subsumes.rank());
        assert_eq!(Equivalence::Subsumes.rank(), Equivalence::Specializes.rank());
        assert!(Equivalence::Specializes.rank() > Equivalence::Wider.rank());
        assert_eq!(Equivalence::Wider.rank(), Equivalence::Narrower.rank());
        assert!(Equivalence::Narrower.rank() > Equivalence::RelatedTo.rank());
        assert!(Equivalence::RelatedTo.rank() > Equivalence::Inexact.rank());
    }

    #[test]
    fn deserializes_both_case_forms() {
        let upper: Equivalence = serde_json::from_str("\"EQUIVALENT\"").unwrap();
        let lower: Equivalence = serde_json::from_str("\"relatedto\"").unwrap();
        assert_eq!(upper, Equivalence::Equivalent);
        assert_eq!(lower, Equivalence::RelatedTo);
        assert_eq!(
            serde_json::to_string(&Equivalence::RelatedTo).unwrap(),
            "\"RELATEDTO\""
        );
    }

    #[test]
    fn inverse_flips_directional_equivalences_only() {
        assert_eq!(Equivalence::Wider.inverse(), Equivalence::Narrower);
        assert_eq!(Equivalence::Subsumes.inverse(), Equivalence::Specializes);
        assert_eq!(Equivalence::Equivalent.inverse(), Equivalence::Equivalent);
    }

    #[test]
    fn weaker_picks_lower_rank() {
        assert_eq!(
            Equivalence::Equivalent.weaker(Equivalence::Wider),
            Equivalence::Wider
        );
        assert_eq!(
            Equivalence::Inexact.weaker(Equivalence::Equal),
            Equivalence::Inexact
        );
    }

    #[test]
    fn manual_request_defaults_to_full_confidence() {
        let request = CreateMappingRequest {
            source_code: " AAE-16 ".into(),
            source_system: "ns".into(),
            target_code: "SP90".into(),
            target_system: "tm2".into(),
            equivalence: Equivalence::Equivalent,
            comment: Some("  ".into()),
            confidence_score: None,
            mapping_version: None,
        };
        assert!(request.validate().is_ok());
        let draft = request.into_draft();
        assert_eq!(draft.key.source_code, "AAE-16");
        assert_eq!(draft.confidence_score, 1.0);
        assert_eq!(draft.comment, None);
        assert_eq!(draft.origin, MappingOrigin::Manual);
    }
}
