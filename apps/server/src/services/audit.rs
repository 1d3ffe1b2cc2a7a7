//! Audit events.
//!
//! Emitted as structured `tracing` events on the `audit` target so that the
//! subscriber decides where they go (console, rolling file, OTLP). Emission is
//! best-effort and never fails the primary request path.

use crate::logging::AUDIT_TARGET;
use crate::models::ConceptMapping;

#[derive(Debug, Clone, Copy)]
pub struct AuditService {
    enabled: bool,
}

impl AuditService {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            tracing::info!("Audit logging initialized (target={})", AUDIT_TARGET);
        }
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn code_lookup(&self, system: &str, code: &str) {
        if !self.enabled {
            return;
        }
        tracing::info!(target: AUDIT_TARGET, operation = "CODE_LOOKUP", system, code, "Code lookup");
    }

    pub fn search(&self, vocabulary: &str, term: &str, results: usize) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            operation = "SEARCH",
            vocabulary,
            term,
            results,
            "Search performed"
        );
    }

    pub fn translation(&self, direction: &str, code: &str, matches: usize) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            operation = "TRANSLATION",
            direction,
            code,
            matches,
            "Code translation"
        );
    }

    pub fn mapping_written(&self, mapping: &ConceptMapping, created: bool) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            operation = if created { "MAPPING_CREATION" } else { "MAPPING_UPDATE" },
            mapping_id = mapping.id,
            source_code = %mapping.source_code,
            target_code = %mapping.target_code,
            equivalence = %mapping.equivalence,
            "Mapping written"
        );
    }

    pub fn mapping_deleted(&self, mapping: &ConceptMapping) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            operation = "MAPPING_DELETION",
            mapping_id = mapping.id,
            source_code = %mapping.source_code,
            target_code = %mapping.target_code,
            "Mapping deleted"
        );
    }

    pub fn data_load(&self, source: &str, records: usize) {
        if !self.enabled {
            return;
        }
        tracing::info!(target: AUDIT_TARGET, operation = "DATA_LOAD", source, records, "Data loaded");
    }

    pub fn data_sync(&self, system: &str, status: &str) {
        if !self.enabled {
            return;
        }
        tracing::info!(target: AUDIT_TARGET, operation = "DATA_SYNC", system, status, "Data sync");
    }

    pub fn job_transition(&self, job_id: &str, job_type: &str, status: &str) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            operation = "JOB",
            job_id,
            job_type,
            status,
            "Job status changed"
        );
    }

    pub fn condition_created(&self, condition_id: &str, patient_id: &str, codings: usize) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            target: AUDIT_TARGET,
            operation = "CONDITION_CREATION",
            condition_id,
            patient_id,
            codings,
            "Dual-coded Condition created"
        );
    }
}
