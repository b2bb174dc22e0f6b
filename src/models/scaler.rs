//! Feature scaler artifacts

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Deterministic numeric transform applied before classification.
pub trait Transformer: Send + Sync {
    /// Map a raw feature vector to a scaled vector of the same length and order
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;

    /// Number of features the transform was fitted on, when known
    fn n_features(&self) -> Option<usize>;
}

/// Fitted scaler parameters exported by the training step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// Standard scaling: (x - mean) / scale
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Min-max scaling as fitted: x * scale + min
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// Max absolute scaling: x / max_abs
    MaxAbs { max_abs: Vec<f64> },
    /// Robust scaling: (x - center) / scale
    Robust { center: Vec<f64>, scale: Vec<f64> },
    /// No scaling
    Identity,
}

/// Zero scale entries leave the feature unscaled
fn safe_scale(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

impl FeatureScaler {
    /// Check that parameter vectors agree in length
    pub fn validate(&self) -> Result<(), String> {
        let (name, a, b) = match self {
            FeatureScaler::Standard { mean, scale } => ("mean/scale", mean.len(), scale.len()),
            FeatureScaler::MinMax { min, scale } => ("min/scale", min.len(), scale.len()),
            FeatureScaler::Robust { center, scale } => ("center/scale", center.len(), scale.len()),
            FeatureScaler::MaxAbs { .. } | FeatureScaler::Identity => return Ok(()),
        };

        if a != b {
            return Err(format!("{} lengths differ ({} vs {})", name, a, b));
        }
        Ok(())
    }

    fn check_len(&self, features: &[f64]) -> Result<(), PredictionError> {
        match self.n_features() {
            Some(expected) if expected != features.len() => Err(PredictionError::DimensionMismatch {
                stage: "Scaler",
                expected,
                actual: features.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl Transformer for FeatureScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.check_len(features)?;

        let scaled: Vec<f64> = match self {
            FeatureScaler::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| (x - m) / safe_scale(*s))
                .collect(),
            FeatureScaler::MinMax { min, scale } => features
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
            FeatureScaler::MaxAbs { max_abs } => features
                .iter()
                .zip(max_abs)
                .map(|(x, m)| x / safe_scale(*m))
                .collect(),
            FeatureScaler::Robust { center, scale } => features
                .iter()
                .zip(center.iter().zip(scale))
                .map(|(x, (c, s))| (x - c) / safe_scale(*s))
                .collect(),
            FeatureScaler::Identity => features.to_vec(),
        };

        if let Some(pos) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::Transform(format!(
                "non-finite value at position {}",
                pos
            )));
        }

        Ok(scaled)
    }

    fn n_features(&self) -> Option<usize> {
        match self {
            FeatureScaler::Standard { mean, .. } => Some(mean.len()),
            FeatureScaler::MinMax { min, .. } => Some(min.len()),
            FeatureScaler::MaxAbs { max_abs } => Some(max_abs.len()),
            FeatureScaler::Robust { center, .. } => Some(center.len()),
            FeatureScaler::Identity => None,
        }
    }
}
