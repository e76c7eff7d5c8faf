pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/parse_resume", post(handlers::handle_parse_resume))
        .route("/score", post(handlers::handle_score))
        .route("/explain", post(handlers::handle_explain))
        .route("/verdict", post(handlers::handle_verdict))
        .route("/batch_analyze", post(handlers::handle_batch_analyze))
        .with_state(state)
}
