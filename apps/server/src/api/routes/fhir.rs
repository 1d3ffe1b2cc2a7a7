//! FHIR API Routes
//!
//! Terminology resources and operations plus the dual-coding endpoints.
//! Paths are case-sensitive. Unknown `$operation` paths fall through to
//! `operations::fallback`, which answers with a not-supported outcome.

use crate::api::handlers::{conditions, fhir, operations};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn fhir_routes() -> Router<AppState> {
    Router::new()
        // Metadata (with and without trailing slash)
        .route("/metadata", get(fhir::capability_statement))
        .route("/metadata/", get(fhir::capability_statement))
        // CodeSystem
        .route("/CodeSystem/namaste-codes", get(fhir::code_system))
        .route(
            "/CodeSystem/$lookup",
            get(operations::lookup).post(operations::lookup),
        )
        .route(
            "/CodeSystem/$validate-code",
            get(operations::validate_code).post(operations::validate_code),
        )
        // ConceptMap
        .route("/ConceptMap/namaste-to-icd11", get(fhir::concept_map))
        .route(
            "/ConceptMap/namaste-to-icd11/$translate",
            get(operations::translate).post(operations::translate),
        )
        .route(
            "/ConceptMap/$translate",
            get(operations::translate).post(operations::translate),
        )
        // ValueSet
        .route("/ValueSet/namaste", get(fhir::value_set))
        .route(
            "/ValueSet/$expand",
            get(operations::expand).post(operations::expand),
        )
        .route(
            "/ValueSet/namaste/$expand",
            get(operations::expand).post(operations::expand),
        )
        // Dual coding
        .route("/Condition", post(conditions::create_condition))
        .route("/Condition/:id", get(conditions::read_condition))
        .route(
            "/ProblemList/Condition",
            get(conditions::problem_list).post(conditions::create_problem_list_condition),
        )
        .route(
            "/ProblemList/ValueSet/dual-coding-autocomplete",
            get(conditions::dual_coding_autocomplete),
        )
        .route(
            "/ProblemList/coding-suggestions/:code",
            get(conditions::coding_suggestions),
        )
        .route(
            "/ProblemList/validate-coding",
            post(conditions::validate_coding),
        )
        .route("/Bundle", post(conditions::process_bundle))
        .fallback(operations::fallback)
}
