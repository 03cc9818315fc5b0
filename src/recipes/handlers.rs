use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

use super::mapping::to_diet;
use super::types::{CatalogFilter, Diet};

#[instrument(skip(state))]
pub async fn list_diets(State(state): State<AppState>) -> Result<Json<Vec<Diet>>, AppError> {
    let records = state
        .catalog
        .list_all()
        .await
        .map_err(AppError::Upstream)?;
    Ok(Json(records.iter().map(to_diet).collect()))
}

#[instrument(skip(state))]
pub async fn get_diet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Diet>, AppError> {
    let record = state
        .catalog
        .get_by_id(id)
        .await
        .map_err(AppError::Upstream)?
        .ok_or_else(|| AppError::NotFound(format!("diet {id}")))?;
    Ok(Json(to_diet(&record)))
}

#[instrument(skip(state))]
pub async fn search_diets(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<Vec<Diet>>, AppError> {
    let records = state
        .catalog
        .search(&filter)
        .await
        .map_err(AppError::Upstream)?;
    Ok(Json(records.iter().map(to_diet).collect()))
}
