pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::recommender::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Rendered form
        .route(
            "/",
            get(handlers::handle_page).post(handlers::handle_page_submit),
        )
        // Form API
        .route("/api/v1/form", get(handlers::handle_get_form))
        .route("/api/v1/form/options", get(handlers::handle_form_options))
        .route("/api/v1/form/fields/:field", put(handlers::handle_set_field))
        .route("/api/v1/form/reset", post(handlers::handle_reset))
        .route("/api/v1/form/submit", post(handlers::handle_submit))
        .with_state(state)
}
