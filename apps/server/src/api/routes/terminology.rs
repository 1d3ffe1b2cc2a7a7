//! Terminology REST routes, mounted under `/terminology`

use crate::api::handlers::{jobs, mappings, terminology, translate};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn terminology_routes() -> Router<AppState> {
    Router::new()
        // NAMASTE
        .route("/namaste/search", get(terminology::search_namaste))
        .route("/namaste/autocomplete", get(terminology::autocomplete_namaste))
        .route("/namaste/categories", get(terminology::namaste_categories))
        .route("/namaste/:system/:code", get(terminology::get_namaste))
        // ICD-11
        .route("/icd11/search", get(terminology::search_icd11))
        .route("/icd11/autocomplete", get(terminology::autocomplete_icd11))
        .route("/icd11/chapters", get(terminology::icd11_chapters))
        .route("/icd11/:code_type/:code", get(terminology::get_icd11))
        // Translation
        .route(
            "/translate/namaste-to-tm2/:code",
            get(translate::namaste_to_tm2),
        )
        .route(
            "/translate/tm2-to-namaste/:code",
            get(translate::tm2_to_namaste),
        )
        .route(
            "/translate/namaste-to-biomedicine/:code",
            get(translate::namaste_to_biomedicine),
        )
        // Curated mappings
        .route(
            "/mapping",
            get(mappings::list_mappings).post(mappings::create_mapping),
        )
        .route(
            "/mapping/:id",
            get(mappings::get_mapping).delete(mappings::delete_mapping),
        )
        .route("/stats", get(terminology::stats))
        // Administrative jobs
        .route("/admin/generate-mappings", post(jobs::generate_mappings))
        .route("/admin/reload-namaste", post(jobs::reload_namaste))
        .route("/admin/sync-icd11", post(jobs::sync_icd11))
        .route("/admin/jobs", get(jobs::list_jobs))
        .route("/admin/jobs/:id", get(jobs::get_job))
        .route("/admin/jobs/:id/cancel", post(jobs::cancel_job))
}
