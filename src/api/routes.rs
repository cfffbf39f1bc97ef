use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // User preferences
        .route(
            "/preferences",
            get(handlers::get_preferences).patch(handlers::update_preferences),
        )
        // Workflow
        .route("/recommend", post(handlers::recommend))
        .route("/iterate", post(handlers::iterate))
        .route("/workflow", get(handlers::workflow_state))
        .route(
            "/workflow/current",
            get(handlers::current_recommendation).delete(handlers::clear_recommendation),
        )
        // History
        .route(
            "/recommendations",
            get(handlers::list_recommendations).delete(handlers::clear_history),
        )
        .route("/recommendations/:id", delete(handlers::delete_recommendation))
}
