//! Artifact loader

use crate::config::ArtifactsConfig;
use crate::error::ArtifactError;
use crate::models::classifier::{Classifier, OnnxClassifier};
use crate::models::decoder::{Decoder, LabelDecoder};
use crate::models::scaler::{FeatureScaler, Transformer};
use crate::schema::{read_dataset_columns, FeatureSchema};
use once_cell::sync::OnceCell;
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Immutable scaler, classifier, decoder and feature schema.
pub struct ArtifactBundle {
    pub scaler: Box<dyn Transformer>,
    pub classifier: Box<dyn Classifier>,
    pub decoder: Box<dyn Decoder>,
    pub schema: FeatureSchema,
}

impl ArtifactBundle {
    /// Assemble a bundle from already-constructed components
    pub fn new(
        scaler: Box<dyn Transformer>,
        classifier: Box<dyn Classifier>,
        decoder: Box<dyn Decoder>,
        schema: FeatureSchema,
    ) -> Self {
        Self {
            scaler,
            classifier,
            decoder,
            schema,
        }
    }
}

impl fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("features", &self.schema.len())
            .field("probabilities", &self.classifier.probability_estimator().is_some())
            .field("inverse_mapping", &self.decoder.inverse_mapping().is_some())
            .finish()
    }
}

/// Locations of the four artifacts
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub encoder: PathBuf,
    pub dataset: PathBuf,
}

impl ArtifactPaths {
    /// Paths in the order they are checked
    pub fn all(&self) -> [&Path; 4] {
        [
            self.model.as_path(),
            self.scaler.as_path(),
            self.encoder.as_path(),
            self.dataset.as_path(),
        ]
    }
}

impl From<&ArtifactsConfig> for ArtifactPaths {
    fn from(config: &ArtifactsConfig) -> Self {
        Self {
            model: PathBuf::from(&config.model_path),
            scaler: PathBuf::from(&config.scaler_path),
            encoder: PathBuf::from(&config.encoder_path),
            dataset: PathBuf::from(&config.dataset_path),
        }
    }
}

/// Loads the artifact bundle once and hands out the cached instance.
///
/// A failed load is not cached, so a later call retries from scratch.
pub struct ArtifactLoader {
    paths: ArtifactPaths,
    target_column: String,
    onnx_threads: usize,
    bundle: OnceCell<Arc<ArtifactBundle>>,
}

impl ArtifactLoader {
    pub fn new(paths: ArtifactPaths, target_column: impl Into<String>) -> Self {
        Self {
            paths,
            target_column: target_column.into(),
            onnx_threads: 1,
            bundle: OnceCell::new(),
        }
    }

    /// Create a loader from the artifacts section of the configuration
    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self::new(ArtifactPaths::from(config), config.target_column.clone())
            .with_threads(config.onnx_threads)
    }

    /// Intra-op threads for the classifier session
    pub fn with_threads(mut self, onnx_threads: usize) -> Self {
        self.onnx_threads = onnx_threads.max(1);
        self
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Load the bundle, or return the one loaded earlier
    pub fn load(&self) -> Result<Arc<ArtifactBundle>, ArtifactError> {
        self.bundle
            .get_or_try_init(|| self.load_uncached().map(Arc::new))
            .cloned()
    }

    fn load_uncached(&self) -> Result<ArtifactBundle, ArtifactError> {
        // Check every file before reading any so a missing one never
        // leaves a half-built bundle behind
        for path in self.paths.all() {
            if !path.exists() {
                return Err(ArtifactError::MissingArtifact {
                    path: path.to_path_buf(),
                });
            }
        }

        let classifier = load_classifier(&self.paths.model, self.onnx_threads)?;

        let scaler: FeatureScaler = read_json(&self.paths.scaler)?;
        scaler.validate().map_err(|reason| ArtifactError::Invalid {
            path: self.paths.scaler.clone(),
            reason,
        })?;

        let decoder: LabelDecoder = read_json(&self.paths.encoder)?;
        decoder.validate().map_err(|reason| ArtifactError::Invalid {
            path: self.paths.encoder.clone(),
            reason,
        })?;

        let columns =
            read_dataset_columns(&self.paths.dataset).map_err(|source| ArtifactError::Dataset {
                path: self.paths.dataset.clone(),
                source,
            })?;
        let schema = FeatureSchema::extract(columns, &self.target_column);
        if schema.is_empty() {
            return Err(ArtifactError::Invalid {
                path: self.paths.dataset.clone(),
                reason: "reference dataset has no feature columns".to_string(),
            });
        }

        if let Some(expected) = scaler.n_features() {
            if expected != schema.len() {
                warn!(
                    scaler_features = expected,
                    schema_features = schema.len(),
                    "Scaler and reference dataset disagree on feature count"
                );
            }
        }

        info!(
            model = %self.paths.model.display(),
            features = schema.len(),
            probabilities = classifier.probability_estimator().is_some(),
            inverse_mapping = decoder.inverse_mapping().is_some(),
            "Artifacts loaded"
        );

        Ok(ArtifactBundle::new(
            Box::new(scaler),
            Box::new(classifier),
            Box::new(decoder),
            schema,
        ))
    }
}

/// Open an ONNX Runtime session on the model and discover its input and outputs
pub fn load_classifier(path: &Path, onnx_threads: usize) -> Result<OnnxClassifier, ArtifactError> {
    let onnx_error = |message: String| ArtifactError::Onnx {
        path: path.to_path_buf(),
        message,
    };

    info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

    let session = Session::builder()
        .map_err(|e| onnx_error(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| onnx_error(e.to_string()))?
        .with_intra_threads(onnx_threads)
        .map_err(|e| onnx_error(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| onnx_error(e.to_string()))?;

    let classifier = OnnxClassifier::new(session).map_err(onnx_error)?;

    info!(
        input = %classifier.input_name(),
        label_output = %classifier.label_output(),
        probability_output = ?classifier.probability_output(),
        "Model loaded successfully"
    );

    Ok(classifier)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Format {
        path: path.to_path_buf(),
        source,
    })
}
