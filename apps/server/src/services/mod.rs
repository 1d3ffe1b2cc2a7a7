//! Business logic layer
//!
//! Services are cheap to clone; they share the snapshot store behind an `Arc`.

pub mod audit;
pub mod cache;
pub mod dual_coding;
pub mod fhir;
pub mod generation;
pub mod mapping;
pub mod registry;
pub mod search;
pub mod translation;

pub use audit::AuditService;
pub use cache::GenerationCache;
pub use dual_coding::{ConditionCategory, ConditionStore, DualCodingService};
pub use fhir::{FhirService, FhirSettings, ValueSetFilterParams};
pub use generation::MappingGenerator;
pub use mapping::MappingService;
pub use registry::CodeRegistryService;
pub use search::{SearchLimits, SearchService};
pub use translation::TranslationService;
