//! Error types for artifact loading and prediction

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the artifact bundle at startup.
///
/// Any of these is fatal to the UI: the form is not rendered and the message
/// is shown to the user as-is.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("File not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read reference dataset {}: {source}", path.display())]
    Dataset {
        path: PathBuf,
        #[source]
        source: polars::prelude::PolarsError,
    },

    #[error("Failed to load ONNX model {}: {message}", path.display())]
    Onnx { path: PathBuf, message: String },

    #[error("Invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ArtifactError {
    /// Path of the artifact that caused the failure
    pub fn path(&self) -> &std::path::Path {
        match self {
            ArtifactError::MissingArtifact { path }
            | ArtifactError::Io { path, .. }
            | ArtifactError::Format { path, .. }
            | ArtifactError::Dataset { path, .. }
            | ArtifactError::Onnx { path, .. }
            | ArtifactError::Invalid { path, .. } => path,
        }
    }
}

/// Errors raised during a predict action.
///
/// These never invalidate the cached bundle; the form stays usable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Schema mismatch: missing feature(s) {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Invalid value {value:?} for {feature}: {reason}")]
    InvalidInput {
        feature: String,
        value: String,
        reason: String,
    },

    #[error("{stage} expected {expected} features, got {actual}")]
    DimensionMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Probability distribution has {probabilities} entries but {classes} class labels are known")]
    ClassCountMismatch { probabilities: usize, classes: usize },
}
