//! Prediction result data structures

use crate::models::classifier::ClassCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a predicted label is framed to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Cautionary,
}

impl Tone {
    /// Positive only for the configured positive label
    pub fn for_label(label: &str, positive_label: &str) -> Self {
        if label == positive_label {
            Tone::Positive
        } else {
            Tone::Cautionary
        }
    }

    /// Qualitative message shown under the result
    pub fn message(&self) -> &'static str {
        match self {
            Tone::Positive => "The student is predicted to complete their studies successfully.",
            Tone::Cautionary => {
                "The student is at high risk of dropping out. Early intervention is recommended."
            }
        }
    }
}

/// Probability assigned to one class label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfidence {
    pub label: String,
    /// Probability in [0, 1]
    pub probability: f64,
}

impl ClassConfidence {
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }
}

/// Outcome of one predict action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Unique prediction identifier
    pub prediction_id: String,

    /// Decoded display label
    pub label: String,

    /// Class code as returned by the classifier
    pub code: ClassCode,

    /// Per-class probabilities, highest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<ClassConfidence>>,

    /// Highest class probability in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Prediction timestamp
    pub predicted_at: DateTime<Utc>,
}

impl PredictionResult {
    /// Create a result without probability information
    pub fn new(label: String, code: ClassCode) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            label,
            code,
            probabilities: None,
            confidence: None,
            predicted_at: Utc::now(),
        }
    }

    /// Attach a probability ranking; sorts it descending and records the
    /// maximum as the confidence
    pub fn with_probabilities(mut self, mut ranking: Vec<ClassConfidence>) -> Self {
        ranking.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        self.confidence = ranking.first().map(|c| c.probability);
        self.probabilities = Some(ranking);
        self
    }

    /// Confidence formatted as a percentage with two decimals, e.g. `80.00%`
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.2}%", c * 100.0))
    }

    pub fn tone(&self, positive_label: &str) -> Tone {
        Tone::for_label(&self.label, positive_label)
    }
}
