//! Axum route handlers for the Scoring API.
//!
//! Fitting is CPU-bound, so every handler moves the locked scorer onto the
//! blocking pool. The mutex is held for the whole fit-then-predict sequence.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::extract_resume_text;
use crate::scoring::batch::{analyze_batch, Candidate, CandidateAnalysis};
use crate::scoring::explainer::{Explanation, FeatureWeight};
use crate::scoring::scorer::Scorer;
use crate::scoring::verdict::{synthesize, Verdict};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub resume_text: String,
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: Vec<FeatureWeight>,
}

#[derive(Debug, Deserialize)]
pub struct VerdictRequest {
    pub score: f64,
    pub explanation: Vec<FeatureWeight>,
}

#[derive(Debug, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub candidates: Vec<Candidate>,
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct BatchAnalyzeResponse {
    pub results: Vec<CandidateAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub filename: String,
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /score
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let score = with_scorer(&state, move |scorer| {
        scorer.score(&request.resume_text, &request.jd_text)
    })
    .await?;
    Ok(Json(ScoreResponse { score }))
}

/// POST /explain
pub async fn handle_explain(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ExplainResponse>, AppError> {
    let explanation = with_scorer(&state, move |scorer| {
        scorer.explain(&request.resume_text, &request.jd_text)
    })
    .await?;
    Ok(Json(ExplainResponse {
        explanation: explanation.features,
    }))
}

/// POST /verdict
///
/// Pure narrative synthesis; does not touch the scorer.
pub async fn handle_verdict(Json(request): Json<VerdictRequest>) -> Result<Json<Verdict>, AppError> {
    if !request.score.is_finite() {
        return Err(AppError::Validation("score must be a finite number".to_string()));
    }
    let explanation = Explanation::from_features(request.explanation);
    Ok(Json(synthesize(request.score, &explanation)))
}

/// POST /batch_analyze
///
/// All candidates share one fit; the lock is held for the whole batch.
pub async fn handle_batch_analyze(
    State(state): State<AppState>,
    Json(request): Json<BatchAnalyzeRequest>,
) -> Result<Json<BatchAnalyzeResponse>, AppError> {
    let results = with_scorer(&state, move |scorer| {
        analyze_batch(scorer, &request.candidates, &request.jd_text)
    })
    .await?;
    Ok(Json(BatchAnalyzeResponse { results }))
}

/// POST /parse_resume
///
/// Multipart upload with a `file` field (PDF or plain text).
pub async fn handle_parse_resume(
    mut multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.txt").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        let name = filename.clone();
        let text = tokio::task::spawn_blocking(move || extract_resume_text(&name, &bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;
        return Ok(Json(ParseResumeResponse { filename, text }));
    }
    Err(AppError::Validation("missing 'file' field".to_string()))
}

/// Runs `f` against the shared scorer on the blocking pool.
async fn with_scorer<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&mut Scorer) -> Result<T, crate::scoring::ScoringError> + Send + 'static,
{
    let scorer = state.scorer.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = scorer
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("scorer lock poisoned")))?;
        f(&mut guard).map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
}
