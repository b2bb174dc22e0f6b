//! Input record collected from the form

use crate::error::PredictionError;
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of feature values keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    values: HashMap<String, f64>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature value, returning the record for chaining
    pub fn with(mut self, feature: impl Into<String>, value: f64) -> Self {
        self.insert(feature, value);
        self
    }

    pub fn insert(&mut self, feature: impl Into<String>, value: f64) {
        self.values.insert(feature.into(), value);
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.values.get(feature).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values reordered to match `schema`.
    ///
    /// Extra fields are ignored; every missing feature is reported.
    pub fn ordered(&self, schema: &FeatureSchema) -> Result<Vec<f64>, PredictionError> {
        let mut missing = Vec::new();
        let mut vector = Vec::with_capacity(schema.len());

        for feature in schema.iter() {
            match self.get(feature) {
                Some(value) => vector.push(value),
                None => missing.push(feature.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(PredictionError::SchemaMismatch { missing });
        }
        Ok(vector)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for InputRecord {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_follows_schema() {
        let schema = FeatureSchema::extract(["A", "B"], "Status");
        let record = InputRecord::new().with("B", 2.0).with("A", 1.0);
        assert_eq!(record.ordered(&schema).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_ordered_reports_missing() {
        let schema = FeatureSchema::extract(["A", "B", "C"], "Status");
        let record: InputRecord = [("B", 2.0), ("Z", 9.0)].into_iter().collect();
        assert_eq!(
            record.ordered(&schema).unwrap_err(),
            PredictionError::SchemaMismatch {
                missing: vec!["A".to_string(), "C".to_string()]
            }
        );
    }

    #[test]
    fn test_deserialize_from_json_object() {
        let record: InputRecord = serde_json::from_str(r#"{"Gender": 1, "Admission_grade": 127.3}"#).unwrap();
        assert_eq!(record.get("Gender"), Some(1.0));
        assert_eq!(record.len(), 2);
    }
}
