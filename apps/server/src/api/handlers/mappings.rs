//! Mapping curation endpoints

use crate::api::extractors::{ApiJson, ApiQuery};
use crate::models::{ConceptMapping, CreateMappingRequest};
use crate::state::AppState;
use crate::{Error, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingListParams {
    pub source_code: Option<String>,
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidParameter(format!("invalid mapping id '{raw}'")))
}

/// POST /terminology/mapping
///
/// 201 when a new edge was created, 200 when an existing edge was updated in place.
pub async fn create_mapping(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMappingRequest>,
) -> Result<(StatusCode, Json<ConceptMapping>)> {
    let write = state.mappings.create(request).await?;
    let status = if write.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(write.mapping)))
}

/// GET /terminology/mapping/{id}
pub async fn get_mapping(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConceptMapping>> {
    Ok(Json(state.mappings.get(parse_id(&id)?)?))
}

/// GET /terminology/mapping?sourceCode=
pub async fn list_mappings(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MappingListParams>,
) -> Json<Vec<ConceptMapping>> {
    let source_code = params
        .source_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    Json(state.mappings.list(source_code))
}

/// DELETE /terminology/mapping/{id}
pub async fn delete_mapping(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.mappings.remove(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
