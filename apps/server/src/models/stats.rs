use serde::{Deserialize, Serialize};

/// Aggregate counts per system and code type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminologyStats {
    pub namaste_code_count: u64,
    pub icd11_code_count: u64,
    pub mapping_count: u64,
    pub ayurveda_count: u64,
    pub siddha_count: u64,
    pub unani_count: u64,
    pub tm2_count: u64,
    pub biomedicine_count: u64,
}
