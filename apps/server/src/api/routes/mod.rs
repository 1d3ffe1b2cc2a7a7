//! Route tables

pub mod fhir;
pub mod metrics;
pub mod terminology;
