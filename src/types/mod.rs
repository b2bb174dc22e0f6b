//! Type definitions for the prediction pipeline

pub mod prediction;
pub mod record;

pub use prediction::{ClassConfidence, PredictionResult, Tone};
pub use record::InputRecord;
