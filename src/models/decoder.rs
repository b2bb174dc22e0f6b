//! Label decoder artifacts

use crate::models::classifier::ClassCode;
use serde::{Deserialize, Serialize};

/// Maps class codes back to display labels.
///
/// Both capabilities are optional; callers check for them instead of
/// inspecting the concrete type.
pub trait Decoder: Send + Sync {
    /// Inverse-mapping capability, if any
    fn inverse_mapping(&self) -> Option<&dyn InverseMapping>;

    /// Known class labels in class-code order, if any
    fn classes(&self) -> Option<&[String]>;
}

/// Code → label lookup. Returns `None` for codes outside the decoder's domain.
pub trait InverseMapping {
    fn inverse_transform(&self, code: &ClassCode) -> Option<String>;
}

/// Decoder artifact exported by the training step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelDecoder {
    /// Sorted class labels; code `i` decodes to `classes[i]`
    LabelEncoder { classes: Vec<String> },
    /// Object without decoding capabilities
    Passthrough,
}

impl LabelDecoder {
    pub fn validate(&self) -> Result<(), String> {
        if let LabelDecoder::LabelEncoder { classes } = self {
            if classes.is_empty() {
                return Err("label encoder has no classes".to_string());
            }
        }
        Ok(())
    }
}

impl Decoder for LabelDecoder {
    fn inverse_mapping(&self) -> Option<&dyn InverseMapping> {
        match self {
            LabelDecoder::LabelEncoder { .. } => Some(self as &dyn InverseMapping),
            LabelDecoder::Passthrough => None,
        }
    }

    fn classes(&self) -> Option<&[String]> {
        match self {
            LabelDecoder::LabelEncoder { classes } => Some(classes.as_slice()),
            LabelDecoder::Passthrough => None,
        }
    }
}

impl InverseMapping for LabelDecoder {
    fn inverse_transform(&self, code: &ClassCode) -> Option<String> {
        let LabelDecoder::LabelEncoder { classes } = self else {
            return None;
        };

        match code {
            ClassCode::Index(i) => usize::try_from(*i).ok().and_then(|i| classes.get(i)).cloned(),
            ClassCode::Label(label) => classes.iter().find(|c| *c == label).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> LabelDecoder {
        LabelDecoder::LabelEncoder {
            classes: vec!["Dropout".to_string(), "Graduate".to_string()],
        }
    }

    #[test]
    fn test_label_encoder_inverse() {
        let decoder = encoder();
        let inverse = decoder.inverse_mapping().unwrap();

        assert_eq!(
            inverse.inverse_transform(&ClassCode::Index(1)),
            Some("Graduate".to_string())
        );
        assert_eq!(inverse.inverse_transform(&ClassCode::Index(2)), None);
        assert_eq!(inverse.inverse_transform(&ClassCode::Index(-1)), None);
        assert_eq!(
            inverse.inverse_transform(&ClassCode::Label("Dropout".into())),
            Some("Dropout".to_string())
        );
    }

    #[test]
    fn test_passthrough_has_no_capabilities() {
        let decoder: LabelDecoder = serde_json::from_str(r#"{"kind":"passthrough"}"#).unwrap();
        assert!(decoder.inverse_mapping().is_none());
        assert!(decoder.classes().is_none());
    }

    #[test]
    fn test_classes_in_code_order() {
        let decoder = encoder();
        assert_eq!(
            decoder.classes().unwrap(),
            &["Dropout".to_string(), "Graduate".to_string()]
        );
    }
}
