pub mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(handlers::get_profile))
        .route("/profile/preferences", put(handlers::put_preferences))
        .route("/profile/categories", put(handlers::put_categories))
        .route("/profile/saved-diets", post(handlers::save_diet))
        .route("/profile/saved-diets/:diet_id", delete(handlers::remove_saved_diet))
}
