//! ONNX classifier and its prediction capabilities

use crate::error::PredictionError;
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::debug;

/// Class code as natively returned by a classifier.
///
/// Models trained on encoded targets return integers; models trained on raw
/// labels return strings. Integral floats (`1.0`) are read as integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawClassCode")]
pub enum ClassCode {
    Index(i64),
    Label(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawClassCode {
    Index(i64),
    Float(f64),
    Label(String),
}

impl From<RawClassCode> for ClassCode {
    fn from(raw: RawClassCode) -> Self {
        match raw {
            RawClassCode::Index(i) => ClassCode::Index(i),
            RawClassCode::Float(f) => ClassCode::from_float(f),
            RawClassCode::Label(s) => ClassCode::Label(s),
        }
    }
}

impl ClassCode {
    /// Integral floats map to `Index`, anything else keeps its text form
    pub fn from_float(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            ClassCode::Index(value as i64)
        } else {
            ClassCode::Label(value.to_string())
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassCode::Index(i) => write!(f, "{}", i),
            ClassCode::Label(s) => f.write_str(s),
        }
    }
}

/// Trained decision model over a scaled feature vector.
pub trait Classifier: Send + Sync {
    /// Predict one class code
    fn predict(&self, features: &[f64]) -> Result<ClassCode, PredictionError>;

    /// Probability estimation capability, if the model has one
    fn probability_estimator(&self) -> Option<&dyn ProbabilityEstimator> {
        None
    }
}

/// Per-class probability estimation, aligned with the model's class order.
pub trait ProbabilityEstimator {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// Classifier backed by an ONNX Runtime session.
///
/// Expects the usual converter layout: one float input of shape
/// `[batch, features]`, a label output, and optionally a probability output
/// that is either a `[batch, classes]` tensor or a sequence of
/// class-to-probability maps.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    label_output: String,
    probability_output: Option<String>,
}

impl OnnxClassifier {
    /// Wrap a session, discovering its input and output names
    pub fn new(session: Session) -> Result<Self, String> {
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| "model has no inputs".to_string())?;

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| "model has no outputs".to_string())?;

        let probability_output = session
            .outputs
            .iter()
            .map(|o| o.name.clone())
            .find(|name| *name != label_output && name.contains("prob"));

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn label_output(&self) -> &str {
        &self.label_output
    }

    pub fn probability_output(&self) -> Option<&str> {
        self.probability_output.as_deref()
    }

    /// Run the session on one row and hand the outputs to `extract`
    fn run<T, F>(&self, features: &[f64], extract: F) -> Result<T, PredictionError>
    where
        F: FnOnce(&SessionOutputs) -> Result<T, PredictionError>,
    {
        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, row.len() as i64];
        let input = Tensor::from_array((shape, row)).map_err(onnx_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PredictionError::Classifier("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(onnx_error)?;

        extract(&outputs)
    }
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input", &self.input_name)
            .field("label_output", &self.label_output)
            .field("probability_output", &self.probability_output)
            .finish()
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f64]) -> Result<ClassCode, PredictionError> {
        self.run(features, |outputs| {
            let output = output_by_name(outputs, &self.label_output)?;
            extract_label(output)
        })
    }

    fn probability_estimator(&self) -> Option<&dyn ProbabilityEstimator> {
        self.probability_output
            .as_ref()
            .map(|_| self as &dyn ProbabilityEstimator)
    }
}

impl ProbabilityEstimator for OnnxClassifier {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        let name = self.probability_output.as_deref().ok_or_else(|| {
            PredictionError::Classifier("model has no probability output".to_string())
        })?;

        self.run(features, |outputs| {
            let output = output_by_name(outputs, name)?;
            extract_probabilities(output)
        })
    }
}

fn onnx_error(e: impl fmt::Display) -> PredictionError {
    PredictionError::Classifier(e.to_string())
}

fn output_by_name<'a>(outputs: &'a SessionOutputs, name: &str) -> Result<&'a DynValue, PredictionError> {
    outputs
        .get(name)
        .ok_or_else(|| PredictionError::Classifier(format!("missing output {}", name)))
}

/// First label of an int64, float or string label tensor
fn extract_label(output: &DynValue) -> Result<ClassCode, PredictionError> {
    let empty = || PredictionError::Classifier("empty label output".to_string());

    if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
        return data.first().map(|&v| ClassCode::Index(v)).ok_or_else(empty);
    }
    if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
        return data
            .first()
            .map(|&v| ClassCode::from_float(v as f64))
            .ok_or_else(empty);
    }
    if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
        return data.first().map(|&v| ClassCode::from_float(v)).ok_or_else(empty);
    }
    if let Ok((_, data)) = output.try_extract_strings() {
        return data.into_iter().next().map(ClassCode::Label).ok_or_else(empty);
    }

    Err(PredictionError::Classifier(format!(
        "unsupported label output type {:?}",
        output.dtype()
    )))
}

/// Class probabilities for the first row, in class order
fn extract_probabilities(output: &DynValue) -> Result<Vec<f64>, PredictionError> {
    if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
        return Ok(data.iter().map(|&p| p as f64).collect());
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output);
    }

    Err(PredictionError::Classifier(format!(
        "unsupported probability output type {:?}",
        dtype
    )))
}

/// seq(map(class, probability)), as written by converters with zipmap on.
/// Entries are sorted by class key, which matches the fitted class order.
fn extract_from_sequence_map(output: &DynValue) -> Result<Vec<f64>, PredictionError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(onnx_error)?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(onnx_error)?;
    let map = maps
        .first()
        .ok_or_else(|| PredictionError::Classifier("empty probability sequence".to_string()))?;

    if let Ok(mut pairs) = map.try_extract_key_values::<i64, f32>() {
        pairs.sort_by_key(|(class, _)| *class);
        debug!(classes = pairs.len(), "Extracted probabilities from seq(map(int64))");
        return Ok(pairs.into_iter().map(|(_, p)| p as f64).collect());
    }

    let mut pairs = map
        .try_extract_key_values::<String, f32>()
        .map_err(onnx_error)?;
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(classes = pairs.len(), "Extracted probabilities from seq(map(string))");
    Ok(pairs.into_iter().map(|(_, p)| p as f64).collect())
}
