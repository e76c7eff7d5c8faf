use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the scorer's settings and fit state.
/// Never waits on the scorer lock; a fit in progress reports as busy.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let settings = &state.config.scorer;
    let fit = match state.scorer.try_lock() {
        Ok(scorer) => json!({
            "fitted": scorer.is_fitted(),
            "fits": scorer.fit_count(),
            "vocabulary_size": scorer.vocabulary_size()
        }),
        Err(_) => json!({ "busy": true }),
    };
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "candidate-api",
        "scorer": {
            "seeded": settings.seed.is_some(),
            "explain_num_samples": settings.explain_num_samples,
            "explain_num_features": settings.explain_num_features,
            "fit": fit
        }
    }))
}
