//! Input form construction.
//!
//! Every schema feature gets one widget. The widget kind comes from an
//! explicit per-feature descriptor when configured, otherwise from an ordered
//! table of case-insensitive substring rules, otherwise the generic integer
//! widget.

use crate::error::PredictionError;
use crate::schema::FeatureSchema;
use crate::types::InputRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Help text shown on binary widgets
pub const BINARY_HELP: &str = "0 = No/Female, 1 = Yes/Male";

/// Widget kind and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetKind {
    /// Decimal number input
    Continuous { default: f64, step: f64 },
    /// Integer slider restricted to [min, max]
    BoundedInteger { min: i64, max: i64, default: i64 },
    /// Choice between 0 and 1; defaults to 0
    Binary {
        #[serde(default = "default_binary_help")]
        help: String,
    },
    /// Unbounded integer input
    Integer { default: i64 },
}

fn default_binary_help() -> String {
    BINARY_HELP.to_string()
}

impl WidgetKind {
    /// Value shown before the user edits the widget
    pub fn default_value(&self) -> f64 {
        match self {
            WidgetKind::Continuous { default, .. } => *default,
            WidgetKind::BoundedInteger { default, .. } => *default as f64,
            WidgetKind::Binary { .. } => 0.0,
            WidgetKind::Integer { default } => *default as f64,
        }
    }

    /// Short name used in the JSON schema listing and logs
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Continuous { .. } => "continuous",
            WidgetKind::BoundedInteger { .. } => "bounded_integer",
            WidgetKind::Binary { .. } => "binary",
            WidgetKind::Integer { .. } => "integer",
        }
    }

    /// Check that the descriptor is usable: bounds ordered, default in range
    pub fn validate(&self) -> Result<(), String> {
        match self {
            WidgetKind::Continuous { default, step } => {
                if !default.is_finite() {
                    return Err(format!("continuous default {} is not finite", default));
                }
                if !(step.is_finite() && *step > 0.0) {
                    return Err(format!("continuous step {} must be positive", step));
                }
                Ok(())
            }
            WidgetKind::BoundedInteger { min, max, default } => {
                if min > max {
                    return Err(format!("min {} is greater than max {}", min, max));
                }
                if default < min || default > max {
                    return Err(format!(
                        "default {} is outside [{}, {}]",
                        default, min, max
                    ));
                }
                Ok(())
            }
            WidgetKind::Binary { .. } | WidgetKind::Integer { .. } => Ok(()),
        }
    }

    /// Coerce a submitted string into the widget's numeric domain
    pub fn coerce(&self, feature: &str, raw: &str) -> Result<f64, PredictionError> {
        let invalid = |reason: String| PredictionError::InvalidInput {
            feature: feature.to_string(),
            value: raw.to_string(),
            reason,
        };
        let value = raw.trim();

        match self {
            WidgetKind::Continuous { .. } => value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid("expected a number".to_string())),
            WidgetKind::BoundedInteger { min, max, .. } => {
                let v = value
                    .parse::<i64>()
                    .map_err(|_| invalid("expected a whole number".to_string()))?;
                if v < *min || v > *max {
                    return Err(invalid(format!("must be between {} and {}", min, max)));
                }
                Ok(v as f64)
            }
            WidgetKind::Binary { .. } => match value {
                "0" => Ok(0.0),
                "1" => Ok(1.0),
                _ => Err(invalid("expected 0 or 1".to_string())),
            },
            WidgetKind::Integer { .. } => value
                .parse::<i64>()
                .map(|v| v as f64)
                .map_err(|_| invalid("expected a whole number".to_string())),
        }
    }
}

/// Substring rule: the widget applies when the lowercased feature name
/// contains any of the substrings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRule {
    pub substrings: Vec<String>,
    pub widget: WidgetKind,
}

impl WidgetRule {
    pub fn new(substrings: &[&str], widget: WidgetKind) -> Self {
        Self {
            substrings: substrings.iter().map(|s| s.to_lowercase()).collect(),
            widget,
        }
    }

    fn matches(&self, lowercase_name: &str) -> bool {
        self.substrings
            .iter()
            .any(|s| lowercase_name.contains(&s.to_lowercase()))
    }

    /// Default rule table, in precedence order
    pub fn defaults() -> Vec<WidgetRule> {
        vec![
            WidgetRule::new(
                &["grade", "rate", "gdp"],
                WidgetKind::Continuous {
                    default: 0.0,
                    step: 0.1,
                },
            ),
            WidgetRule::new(
                &["age"],
                WidgetKind::BoundedInteger {
                    min: 15,
                    max: 60,
                    default: 20,
                },
            ),
            WidgetRule::new(
                &["gender", "scholarship", "tuition"],
                WidgetKind::Binary {
                    help: BINARY_HELP.to_string(),
                },
            ),
        ]
    }
}

/// Widget selection: explicit descriptors, then rules, then generic integer
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSelector {
    overrides: HashMap<String, WidgetKind>,
    rules: Vec<WidgetRule>,
}

impl WidgetSelector {
    pub fn new(rules: Vec<WidgetRule>, overrides: HashMap<String, WidgetKind>) -> Self {
        Self { overrides, rules }
    }

    pub fn select(&self, feature: &str) -> WidgetKind {
        if let Some(widget) = self.overrides.get(feature) {
            return widget.clone();
        }

        let lowercase = feature.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowercase))
            .map(|rule| rule.widget.clone())
            .unwrap_or(WidgetKind::Integer { default: 0 })
    }
}

impl Default for WidgetSelector {
    fn default() -> Self {
        Self::new(WidgetRule::defaults(), HashMap::new())
    }
}

/// One rendered form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub widget: WidgetKind,
}

/// Coerced form submission.
///
/// `record` holds every field that coerced or was absent (widget default).
/// Fields that failed coercion are left out of `record`; their raw text is
/// kept in `rejected` so the page can show it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub record: InputRecord,
    pub rejected: HashMap<String, String>,
    /// First failure in schema order
    pub error: Option<PredictionError>,
}

/// Form fields in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputForm {
    fields: Vec<FormField>,
}

impl InputForm {
    /// One field per schema feature, in schema order
    pub fn build(schema: &FeatureSchema, selector: &WidgetSelector) -> Self {
        let fields = schema
            .iter()
            .map(|name| FormField {
                name: name.to_string(),
                widget: selector.select(name),
            })
            .collect();

        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Record holding every widget's default value
    pub fn default_record(&self) -> InputRecord {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.widget.default_value()))
            .collect()
    }

    /// Coerce every submitted value, keeping going past failures.
    /// Fields absent from the submission take their widget default; unknown
    /// submitted keys are ignored.
    pub fn submit(&self, submitted: &HashMap<String, String>) -> Submission {
        let mut record = InputRecord::new();
        let mut rejected = HashMap::new();
        let mut error = None;

        for field in &self.fields {
            let raw = match submitted.get(&field.name) {
                Some(raw) => raw,
                None => {
                    record.insert(field.name.clone(), field.widget.default_value());
                    continue;
                }
            };
            match field.widget.coerce(&field.name, raw) {
                Ok(value) => record.insert(field.name.clone(), value),
                Err(e) => {
                    rejected.insert(field.name.clone(), raw.clone());
                    error.get_or_insert(e);
                }
            }
        }

        Submission {
            record,
            rejected,
            error,
        }
    }

    /// Coerce submitted values into a complete record, failing on the first
    /// invalid field
    pub fn collect(&self, submitted: &HashMap<String, String>) -> Result<InputRecord, PredictionError> {
        let submission = self.submit(submitted);
        match submission.error {
            Some(e) => Err(e),
            None => Ok(submission.record),
        }
    }
}
