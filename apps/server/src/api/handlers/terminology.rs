//! Terminology REST endpoints: search, autocomplete, code lookup, stats

use super::{parse_code_type, parse_system};
use crate::api::extractors::ApiQuery;
use crate::models::{Icd11Code, NamasteCode, PaginatedResponse, TerminologyStats};
use crate::state::AppState;
use crate::{Error, Result};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub term: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub system: Option<String>,
    pub code_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteParams {
    pub term: Option<String>,
    pub limit: Option<usize>,
    pub code_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub system: Option<String>,
    pub code_type: Option<String>,
}

fn required_term(term: Option<String>) -> Result<String> {
    term.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::InvalidParameter("term is required".to_string()))
}

/// GET /terminology/namaste/search
pub async fn search_namaste(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<PaginatedResponse<NamasteCode>>> {
    let term = required_term(params.term)?;
    let system = parse_system(params.system.as_deref())?;
    Ok(Json(state.search.search_namaste(
        &term,
        system,
        params.page,
        params.size,
    )))
}

/// GET /terminology/namaste/autocomplete
pub async fn autocomplete_namaste(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AutocompleteParams>,
) -> Json<Vec<NamasteCode>> {
    let term = params.term.unwrap_or_default();
    Json(state.search.autocomplete_namaste(term.trim(), params.limit))
}

/// GET /terminology/icd11/search
pub async fn search_icd11(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<PaginatedResponse<Icd11Code>>> {
    let term = required_term(params.term)?;
    let code_type = parse_code_type(params.code_type.as_deref())?;
    Ok(Json(state.search.search_icd11(
        &term,
        code_type,
        params.page,
        params.size,
    )))
}

/// GET /terminology/icd11/autocomplete
pub async fn autocomplete_icd11(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AutocompleteParams>,
) -> Result<Json<Vec<Icd11Code>>> {
    let code_type = parse_code_type(params.code_type.as_deref())?;
    let term = params.term.unwrap_or_default();
    Ok(Json(state.search.autocomplete_icd11(
        term.trim(),
        code_type,
        params.limit,
    )))
}

/// GET /terminology/namaste/{system}/{code}
pub async fn get_namaste(
    State(state): State<AppState>,
    Path((system, code)): Path<(String, String)>,
) -> Result<Json<NamasteCode>> {
    let system = parse_system(Some(&system))?;
    Ok(Json(state.registry.get_namaste(system, &code)?))
}

/// GET /terminology/icd11/{codeType}/{code}
pub async fn get_icd11(
    State(state): State<AppState>,
    Path((code_type, code)): Path<(String, String)>,
) -> Result<Json<Icd11Code>> {
    let code_type = parse_code_type(Some(&code_type))?
        .ok_or_else(|| Error::InvalidParameter("codeType is required".to_string()))?;
    Ok(Json(state.registry.get_icd11(code_type, &code)?))
}

/// GET /terminology/namaste/categories
pub async fn namaste_categories(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FilterParams>,
) -> Result<Json<BTreeSet<String>>> {
    let system = parse_system(params.system.as_deref())?;
    Ok(Json(state.registry.categories(system)))
}

/// GET /terminology/icd11/chapters
pub async fn icd11_chapters(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FilterParams>,
) -> Result<Json<BTreeSet<String>>> {
    let code_type = parse_code_type(params.code_type.as_deref())?;
    Ok(Json(state.registry.chapters(code_type)))
}

/// GET /terminology/stats
pub async fn stats(State(state): State<AppState>) -> Json<TerminologyStats> {
    Json(state.registry.stats())
}
