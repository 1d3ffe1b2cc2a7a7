//! Fixed-direction translation endpoints

use crate::models::TranslationMatch;
use crate::state::AppState;
use crate::Result;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /terminology/translate/namaste-to-tm2/{code}
pub async fn namaste_to_tm2(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TranslationMatch>>> {
    Ok(Json(state.translation.namaste_to_tm2(&code)?))
}

/// GET /terminology/translate/tm2-to-namaste/{code}
pub async fn tm2_to_namaste(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TranslationMatch>>> {
    Ok(Json(state.translation.tm2_to_namaste(&code)?))
}

/// GET /terminology/translate/namaste-to-biomedicine/{code}
pub async fn namaste_to_biomedicine(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TranslationMatch>>> {
    Ok(Json(state.translation.namaste_to_biomedicine(&code)?))
}
