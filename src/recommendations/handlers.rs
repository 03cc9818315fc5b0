use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{instrument, warn};

use crate::auth::extractors::{AuthUser, MaybeAuthUser};
use crate::cache::CacheStats;
use crate::error::AppError;
use crate::recipes::types::Diet;
use crate::state::AppState;

use super::dto::{CacheKeySpec, PopularQuery, SimilarQuery, TrackViewRequest, ANONYMOUS_USER};

#[instrument(skip(state))]
pub async fn get_similar(
    State(state): State<AppState>,
    Path(diet_id): Path<String>,
    Query(q): Query<SimilarQuery>,
) -> Result<Json<Vec<Diet>>, AppError> {
    let diets = state
        .recommendations
        .get_similar(&diet_id, q.count)
        .await
        .map_err(AppError::Upstream)?;
    Ok(Json(diets))
}

#[instrument(skip(state))]
pub async fn get_popular(
    State(state): State<AppState>,
    Query(q): Query<PopularQuery>,
) -> Result<Json<Vec<Diet>>, AppError> {
    let diets = state
        .recommendations
        .get_popular(q.count)
        .await
        .map_err(AppError::Upstream)?;
    Ok(Json(diets))
}

/// Personalized list for the authenticated user. A failed personalization
/// pipeline (profile store down included) degrades to the popular list.
#[instrument(skip(state))]
pub async fn get_personalized(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Query(q): Query<PopularQuery>,
) -> Result<Json<Vec<Diet>>, AppError> {
    match state.personalization.get_personalized(&email, q.count).await {
        Ok(diets) => Ok(Json(diets)),
        Err(e) => {
            warn!(error = %e, user = %email, "personalization failed, serving popular");
            let diets = state
                .recommendations
                .get_popular(q.count)
                .await
                .map_err(AppError::Upstream)?;
            Ok(Json(diets))
        }
    }
}

/// Fire-and-forget: responds 202 immediately, the notification runs on a
/// detached task whose outcome is only ever logged.
#[instrument(skip(state, body))]
pub async fn track_view(
    State(state): State<AppState>,
    MaybeAuthUser(email): MaybeAuthUser,
    Json(body): Json<TrackViewRequest>,
) -> StatusCode {
    let user = email.unwrap_or_else(|| ANONYMOUS_USER.to_string());
    let personalization = state.personalization.clone();
    tokio::spawn(async move {
        personalization.track_view(&user, &body.diet_id).await;
    });
    StatusCode::ACCEPTED
}

#[instrument(skip(state))]
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Clears one (type, params) entry when a key spec is posted, otherwise the
/// whole cache.
#[instrument(skip(state))]
pub async fn cache_clear(
    State(state): State<AppState>,
    body: Option<Json<CacheKeySpec>>,
) -> StatusCode {
    match body {
        Some(Json(spec)) => state.cache.clear_one(&spec.into_key()).await,
        None => state.cache.clear_all().await,
    }
    StatusCode::NO_CONTENT
}
