//! Model artifacts and the inference pipeline

pub mod classifier;
pub mod decoder;
pub mod inference;
pub mod loader;
pub mod scaler;

pub use classifier::{ClassCode, Classifier, OnnxClassifier, ProbabilityEstimator};
pub use decoder::{Decoder, InverseMapping, LabelDecoder};
pub use inference::InferenceEngine;
pub use loader::{load_classifier, ArtifactBundle, ArtifactLoader, ArtifactPaths};
pub use scaler::{FeatureScaler, Transformer};
