pub mod client;
pub mod dto;
pub mod handlers;
pub mod service;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommendations/similar/:diet_id", get(handlers::get_similar))
        .route("/recommendations/popular", get(handlers::get_popular))
        .route("/recommendations/personalized", get(handlers::get_personalized))
        .route("/recommendations/view", post(handlers::track_view))
        .route("/admin/cache/stats", get(handlers::cache_stats))
        .route("/admin/cache/clear", post(handlers::cache_clear))
}
