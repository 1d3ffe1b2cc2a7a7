//! Storage layer - in-memory registry, mapping graph and derived tables behind a snapshot store

pub mod graph;
pub mod index;
pub mod locks;
pub mod registry;
pub mod shortcuts;
pub mod store;
pub mod systems;

pub use graph::{edge_order, GraphState};
pub use index::{Hit, MatchTier, SearchIndex, VocabIndex};
pub use locks::{KeyGuard, KeyLocks};
pub use registry::{validate_code, NamasteRecord, RegistryState};
pub use shortcuts::{Shortcut, ShortcutTable, ShortcutTarget};
pub use store::{ConceptRef, GeneratedBatch, MappingWrite, Snapshot, TerminologyStore};
pub use systems::SystemUris;
