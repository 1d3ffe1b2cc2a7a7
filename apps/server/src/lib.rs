//! AYUSH terminology server
//!
//! Maps NAMASTE codes (Ayurveda, Siddha, Unani) to ICD-11 Traditional Medicine
//! Chapter 2 and ICD-11 biomedicine:
//! - In-memory code registry and mapping graph published as immutable snapshots
//! - Direct and one-hop bridged translation
//! - Search and autocomplete
//! - FHIR R4 CodeSystem, ConceptMap, ValueSet and terminology operations
//! - Dual-coded Condition and Bundle processing
//! - Background ingestion jobs (CSV, WHO ICD-11 API) and mapping generation
//! - An operator console (`terminology-cli`)

#![allow(
    clippy::too_many_arguments,      // Service constructors take their collaborators explicitly
    clippy::type_complexity,         // Nested snapshot types mirror the domain
)]

pub mod api;
pub mod background;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod queue;
pub mod request_context;
pub mod services;
pub mod state;
pub mod workers;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
