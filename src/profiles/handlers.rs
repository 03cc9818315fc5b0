use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::auth::extractors::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

use super::dto::{DietCategory, SaveDietRequest, UserPreferences, UserProfile};

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.profiles.find(&email).await?.unwrap_or_default();
    Ok(Json(profile))
}

#[instrument(skip(state, body))]
pub async fn put_preferences(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Json(body): Json<UserPreferences>,
) -> Result<StatusCode, AppError> {
    state.profiles.put_preferences(&email, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, body))]
pub async fn put_categories(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Json(body): Json<Vec<DietCategory>>,
) -> Result<StatusCode, AppError> {
    state.profiles.put_categories(&email, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn save_diet(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Json(body): Json<SaveDietRequest>,
) -> Result<StatusCode, AppError> {
    state
        .profiles
        .save_diet(&email, &body.diet_id, body.category.as_deref())
        .await?;
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state))]
pub async fn remove_saved_diet(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Path(diet_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.profiles.remove_saved_diet(&email, &diet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
