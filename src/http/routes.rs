use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call control
        .route("/calls", post(handlers::start_call))
        .route(
            "/calls/:call_id",
            get(handlers::get_call).delete(handlers::remove_call),
        )
        .route("/calls/:call_id/start", post(handlers::restart_call))
        .route("/calls/:call_id/mute", post(handlers::toggle_mute))
        .route("/calls/:call_id/disconnect", post(handlers::disconnect_call))
        // Call queries
        .route("/calls/:call_id/transcript", get(handlers::get_transcript))
        // Browser front ends call in from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
