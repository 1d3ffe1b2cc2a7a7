//! API layer - routes, handlers, and middleware

pub mod content_negotiation;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod resource_formatter;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_request_body_size;
    let cors_origins = state.config.server.cors_origins.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/favicon.ico", get(favicon))
        .merge(routes::metrics::metrics_routes())
        .nest("/terminology", routes::terminology::terminology_routes())
        .nest("/fhir", routes::fhir::fhir_routes())
        .with_state(state)
        // Applied in reverse order
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(middleware::compression())
        .layer(middleware::cors(&cors_origins))
        .layer(middleware::trace())
        .layer(DefaultBodyLimit::max(max_body_size))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "ayush-terminology"
    }))
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.fhir.settings();
    (
        StatusCode::OK,
        Json(json!({
            "server": "AYUSH Terminology Server",
            "version": env!("CARGO_PKG_VERSION"),
            "fhirBaseUrl": settings.base_url,
            "namasteVersion": settings.namaste_version,
            "status": "running"
        })),
    )
}

async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
