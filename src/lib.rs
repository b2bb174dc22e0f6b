//! Student Status Predictor Library
//!
//! Serves a pre-trained scaler, classifier and label decoder behind an
//! interactive form that predicts whether a student will drop out or
//! graduate.

pub mod config;
pub mod error;
pub mod form;
pub mod models;
pub mod presenter;
pub mod schema;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{ArtifactError, PredictionError};
pub use form::{InputForm, WidgetKind, WidgetSelector};
pub use models::{ArtifactBundle, ArtifactLoader, InferenceEngine};
pub use schema::FeatureSchema;
pub use types::{InputRecord, PredictionResult};
