//! HTTP request handlers

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::PredictionError;
use crate::presenter::{self, Outcome};
use crate::types::{InputRecord, PredictionResult};

use super::error::Result;
use super::state::{AppState, Predictor};

// ============================================================================
// Page Handlers
// ============================================================================

/// Form page with widget defaults
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match state.as_ref() {
        AppState::Ready(p) => Html(presenter::render_page(
            &p.form,
            &p.form.default_record(),
            Outcome::Pending,
            &p.positive_label,
        ))
        .into_response(),
        AppState::Unavailable(message) => load_failure(message),
    }
}

/// Form submission: coerce, predict, render the page with the outcome
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let p = match state.as_ref() {
        AppState::Ready(p) => p,
        AppState::Unavailable(message) => return load_failure(message),
    };

    // Repeated keys: the last submitted value wins
    let submitted: HashMap<String, String> = fields.into_iter().collect();

    let submission = p.form.submit(&submitted);
    let html = match &submission.error {
        None => match run_prediction(p, &submission.record) {
            Ok(result) => presenter::render_page(
                &p.form,
                &submission.record,
                Outcome::Predicted(&result),
                &p.positive_label,
            ),
            Err(e) => presenter::render_page(
                &p.form,
                &submission.record,
                Outcome::Failed(&e),
                &p.positive_label,
            ),
        },
        Some(e) => {
            warn!(error = %e, rejected = submission.rejected.len(), "Rejected form submission");
            presenter::render_submission(&p.form, &submission, Outcome::Failed(e), &p.positive_label)
        }
    };

    Html(html).into_response()
}

fn load_failure(message: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(presenter::render_load_failure(message)),
    )
        .into_response()
}

// ============================================================================
// JSON API Handlers
// ============================================================================

/// Feature names in schema order with their widget descriptors
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let p = state.predictor()?;
    Ok(Json(json!({
        "features": p.form.fields(),
    })))
}

/// Body of `POST /api/predict`
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: HashMap<String, f64>,
}

/// Predict from a JSON feature map
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictionResult>> {
    let p = state.predictor()?;
    let record: InputRecord = request.features.into_iter().collect();
    let result = run_prediction(p, &record)?;
    Ok(Json(result))
}

/// Liveness plus artifact status
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (artifacts, features) = match state.as_ref() {
        AppState::Ready(p) => ("loaded", p.form.fields().len()),
        AppState::Unavailable(_) => ("unavailable", 0),
    };

    Json(json!({
        "status": "healthy",
        "artifacts": artifacts,
        "features": features,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

fn run_prediction(
    p: &Predictor,
    record: &InputRecord,
) -> std::result::Result<PredictionResult, PredictionError> {
    let start = Instant::now();
    match p.engine.predict(record) {
        Ok(result) => {
            info!(
                prediction_id = %result.prediction_id,
                label = %result.label,
                confidence = ?result.confidence_percent(),
                latency_us = start.elapsed().as_micros() as u64,
                "Prediction served"
            );
            Ok(result)
        }
        Err(e) => {
            warn!(
                error = %e,
                latency_us = start.elapsed().as_micros() as u64,
                "Prediction failed"
            );
            Err(e)
        }
    }
}
