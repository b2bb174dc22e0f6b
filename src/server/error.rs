//! Error types for the server

use crate::error::PredictionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Artifacts failed to load at startup
    #[error("Failed to load model/data files: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Prediction(e) => {
                tracing::warn!(error = %e, "Prediction failed");
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };

        let body = Json(json!({
            "error": true,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
