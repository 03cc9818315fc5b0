pub mod client;
pub mod handlers;
pub mod mapping;
pub mod types;

use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/diets", get(handlers::list_diets))
        .route("/diets/search", get(handlers::search_diets))
        .route("/diets/:id", get(handlers::get_diet))
}
