//! Domain models for the terminology server

pub mod codes;
pub mod condition;
pub mod mapping;
pub mod paging;
pub mod stats;
pub mod translation;

pub use codes::{
    CrosswalkHints, Icd11Code, Icd11CodeType, NamasteCode, NewIcd11Code, NewNamasteCode,
    TraditionalSystem, Vocabulary,
};
pub use condition::{CreateConditionRequest, ValidateCodingRequest};
pub use mapping::{
    ConceptMapping, CreateMappingRequest, Equivalence, MappingDraft, MappingKey, MappingOrigin,
};
pub use paging::{PageRequest, PaginatedResponse};
pub use stats::TerminologyStats;
pub use translation::{BridgeHop, TranslationMatch};
