pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/v1/analysis",
            get(handlers::handle_get_analysis).post(handlers::handle_upload),
        )
        .route("/api/v1/analysis/reset", post(handlers::handle_reset))
        .route("/api/v1/analysis/chat", post(handlers::handle_chat))
        .route("/api/v1/analysis/report", get(handlers::handle_report))
        // Résumé uploads are bounded by the model provider, not locally.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
