//! Inference pipeline: reindex, scale, classify, decode, rank

use crate::config::LabelsConfig;
use crate::error::PredictionError;
use crate::models::classifier::ClassCode;
use crate::models::loader::ArtifactBundle;
use crate::types::{ClassConfidence, InputRecord, PredictionResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs predictions against a shared, immutable artifact bundle
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    bundle: Arc<ArtifactBundle>,
    /// Labels used when the decoder cannot map a code; index = class code
    fallback_labels: Vec<String>,
}

impl InferenceEngine {
    pub fn new(bundle: Arc<ArtifactBundle>, labels: &LabelsConfig) -> Self {
        Self {
            bundle,
            fallback_labels: labels.fallback.clone(),
        }
    }

    pub fn bundle(&self) -> &Arc<ArtifactBundle> {
        &self.bundle
    }

    /// Run the full pipeline on one record.
    ///
    /// Steps run in a fixed order: reindex to schema order, scale, classify,
    /// decode, then rank class probabilities when the classifier supports it.
    pub fn predict(&self, record: &InputRecord) -> Result<PredictionResult, PredictionError> {
        let ordered = record.ordered(&self.bundle.schema)?;
        let scaled = self.bundle.scaler.transform(&ordered)?;
        if scaled.len() != ordered.len() {
            return Err(PredictionError::Transform(format!(
                "scaler returned {} values for {} features",
                scaled.len(),
                ordered.len()
            )));
        }

        let code = self.bundle.classifier.predict(&scaled)?;
        let label = self.decode(&code);
        let mut result = PredictionResult::new(label, code);

        if let Some(estimator) = self.bundle.classifier.probability_estimator() {
            let probabilities = estimator.predict_proba(&scaled)?;
            result = result.with_probabilities(self.rank(probabilities)?);
        }

        debug!(
            prediction_id = %result.prediction_id,
            label = %result.label,
            confidence = ?result.confidence,
            "Prediction complete"
        );

        Ok(result)
    }

    /// Decoder mapping first, then the fallback labels, then the raw code
    fn decode(&self, code: &ClassCode) -> String {
        if let Some(inverse) = self.bundle.decoder.inverse_mapping() {
            if let Some(label) = inverse.inverse_transform(code) {
                return label;
            }
        }

        if let ClassCode::Index(i) = code {
            if let Some(label) = usize::try_from(*i).ok().and_then(|i| self.fallback_labels.get(i)) {
                return label.clone();
            }
        }

        warn!(code = %code, "Class code not recognized by decoder or fallback labels, showing raw code");
        code.to_string()
    }

    /// Pair probabilities with class labels
    fn rank(&self, probabilities: Vec<f64>) -> Result<Vec<ClassConfidence>, PredictionError> {
        let labels = self
            .bundle
            .decoder
            .classes()
            .unwrap_or(self.fallback_labels.as_slice());

        if labels.len() != probabilities.len() {
            return Err(PredictionError::ClassCountMismatch {
                probabilities: probabilities.len(),
                classes: labels.len(),
            });
        }

        Ok(labels
            .iter()
            .zip(probabilities)
            .map(|(label, probability)| ClassConfidence {
                label: label.clone(),
                probability,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::{Classifier, ProbabilityEstimator};
    use crate::models::decoder::LabelDecoder;
    use crate::models::scaler::Transformer;
    use crate::schema::FeatureSchema;
    use std::sync::Mutex;

    /// Scaler that records the vector it was given
    #[derive(Default)]
    struct RecordingScaler {
        seen: Arc<Mutex<Vec<Vec<f64>>>>,
    }

    impl Transformer for RecordingScaler {
        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(features.to_vec())
        }

        fn n_features(&self) -> Option<usize> {
            None
        }
    }

    /// Classifier with a fixed answer and optional fixed probabilities
    struct FixedClassifier {
        code: ClassCode,
        proba: Option<Vec<f64>>,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, _features: &[f64]) -> Result<ClassCode, PredictionError> {
            Ok(self.code.clone())
        }

        fn probability_estimator(&self) -> Option<&dyn ProbabilityEstimator> {
            self.proba.as_ref().map(|_| self as &dyn ProbabilityEstimator)
        }
    }

    impl ProbabilityEstimator for FixedClassifier {
        fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>, PredictionError> {
            Ok(self.proba.clone().unwrap_or_default())
        }
    }

    fn engine(code: ClassCode, proba: Option<Vec<f64>>, decoder: LabelDecoder) -> InferenceEngine {
        let bundle = ArtifactBundle::new(
            Box::new(RecordingScaler::default()),
            Box::new(FixedClassifier { code, proba }),
            Box::new(decoder),
            FeatureSchema::extract(["A", "B"], "Status"),
        );
        InferenceEngine::new(Arc::new(bundle), &LabelsConfig::default())
    }

    fn label_encoder() -> LabelDecoder {
        LabelDecoder::LabelEncoder {
            classes: vec!["Dropout".to_string(), "Graduate".to_string()],
        }
    }

    fn record() -> InputRecord {
        InputRecord::new().with("B", 2.0).with("A", 1.0)
    }

    #[test]
    fn test_record_reindexed_before_scaling() {
        let scaler = RecordingScaler::default();
        let seen = scaler.seen.clone();
        let bundle = ArtifactBundle::new(
            Box::new(scaler),
            Box::new(FixedClassifier {
                code: ClassCode::Index(0),
                proba: None,
            }),
            Box::new(LabelDecoder::Passthrough),
            FeatureSchema::extract(["A", "B"], "Status"),
        );
        let engine = InferenceEngine::new(Arc::new(bundle), &LabelsConfig::default());

        engine.predict(&record()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn test_decoder_inverse_mapping() {
        let engine = engine(ClassCode::Index(1), None, label_encoder());
        let result = engine.predict(&record()).unwrap();
        assert_eq!(result.label, "Graduate");
        assert!(result.probabilities.is_none());
        assert!(result.confidence_percent().is_none());
    }

    #[test]
    fn test_fallback_mapping_without_decoder() {
        let engine = engine(ClassCode::Index(0), None, LabelDecoder::Passthrough);
        assert_eq!(engine.predict(&record()).unwrap().label, "Dropout");
    }

    #[test]
    fn test_out_of_domain_code_uses_fallback_then_raw() {
        let engine = engine(
            ClassCode::Index(1),
            None,
            LabelDecoder::LabelEncoder {
                classes: vec!["Only".to_string()],
            },
        );
        assert_eq!(engine.predict(&record()).unwrap().label, "Graduate");

        let engine = engine_with_code(ClassCode::Index(7));
        assert_eq!(engine.predict(&record()).unwrap().label, "7");

        let engine = engine_with_code(ClassCode::Label("Enrolled".to_string()));
        assert_eq!(engine.predict(&record()).unwrap().label, "Enrolled");
    }

    fn engine_with_code(code: ClassCode) -> InferenceEngine {
        engine(code, None, LabelDecoder::Passthrough)
    }

    #[test]
    fn test_probability_ranking() {
        let engine = engine(ClassCode::Index(1), Some(vec![0.2, 0.8]), label_encoder());
        let result = engine.predict(&record()).unwrap();

        assert_eq!(result.confidence_percent().as_deref(), Some("80.00%"));
        let ranking = result.probabilities.unwrap();
        assert_eq!(ranking[0].label, "Graduate");
        assert_eq!(ranking[1].label, "Dropout");
    }

    #[test]
    fn test_probabilities_use_fallback_labels_without_class_list() {
        let engine = engine(ClassCode::Index(0), Some(vec![0.7, 0.3]), LabelDecoder::Passthrough);
        let ranking = engine.predict(&record()).unwrap().probabilities.unwrap();
        assert_eq!(ranking[0].label, "Dropout");
        assert!((ranking[0].percent() - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_class_count_mismatch() {
        let engine = engine(ClassCode::Index(0), Some(vec![0.2, 0.3, 0.5]), label_encoder());
        assert_eq!(
            engine.predict(&record()).unwrap_err(),
            PredictionError::ClassCountMismatch {
                probabilities: 3,
                classes: 2
            }
        );
    }

    #[test]
    fn test_missing_feature_is_schema_mismatch() {
        let engine = engine(ClassCode::Index(1), None, label_encoder());
        let err = engine
            .predict(&InputRecord::new().with("A", 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            PredictionError::SchemaMismatch {
                missing: vec!["B".to_string()]
            }
        );
    }
}
