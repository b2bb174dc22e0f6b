//! Configuration management for the predictor service

use crate::form::{WidgetKind, WidgetRule, WidgetSelector};
use crate::schema::DEFAULT_TARGET_COLUMN;
use anyhow::{anyhow, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub form: FormConfig,
    pub labels: LabelsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Artifact locations, relative to the working directory
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// ONNX classifier graph
    pub model_path: String,
    /// Intra-op threads for the ONNX Runtime session
    pub onnx_threads: usize,
    /// Serialized feature scaler
    pub scaler_path: String,
    /// Serialized label decoder
    pub encoder_path: String,
    /// Reference dataset defining the feature schema
    pub dataset_path: String,
    /// Target column excluded from the schema
    pub target_column: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: "best_model.onnx".to_string(),
            onnx_threads: 1,
            scaler_path: "scaler.json".to_string(),
            encoder_path: "encoder.json".to_string(),
            dataset_path: "data/data_fix.csv".to_string(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
        }
    }
}

/// Form widget selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Ordered substring rules; first match wins
    pub rules: Vec<WidgetRule>,
    /// Explicit widget per feature name, checked before the rules
    pub overrides: Vec<WidgetOverride>,
}

/// Explicit widget descriptor for one feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WidgetOverride {
    pub feature: String,
    pub widget: WidgetKind,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            rules: WidgetRule::defaults(),
            overrides: Vec::new(),
        }
    }
}

impl FormConfig {
    /// Reject widget descriptors that cannot be rendered or sampled
    pub fn validate(&self) -> Result<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            rule.widget
                .validate()
                .map_err(|reason| anyhow!("form.rules[{}]: {}", index, reason))?;
        }
        for o in &self.overrides {
            o.widget
                .validate()
                .map_err(|reason| anyhow!("form.overrides {}: {}", o.feature, reason))?;
        }
        Ok(())
    }

    pub fn selector(&self) -> WidgetSelector {
        let overrides: HashMap<String, WidgetKind> = self
            .overrides
            .iter()
            .map(|o| (o.feature.clone(), o.widget.clone()))
            .collect();
        WidgetSelector::new(self.rules.clone(), overrides)
    }
}

/// Label decoding and presentation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Labels for integer class codes when the decoder cannot map them;
    /// index = class code
    pub fallback: Vec<String>,
    /// Label presented with positive framing
    pub positive: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            fallback: vec!["Dropout".to_string(), "Graduate".to_string()],
            positive: "Graduate".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file, if present
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path; a missing file yields defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.form.validate().context("Invalid form widget configuration")?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.artifacts.model_path, "best_model.onnx");
        assert_eq!(config.artifacts.onnx_threads, 1);
        assert_eq!(config.artifacts.dataset_path, "data/data_fix.csv");
        assert_eq!(config.artifacts.target_column, "Status");
        assert_eq!(config.form.rules.len(), 3);
        assert_eq!(config.labels.fallback, vec!["Dropout", "Graduate"]);
        assert_eq!(config.labels.positive, "Graduate");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[artifacts]
model_path = "models/rf.onnx"
onnx_threads = 4

[[form.rules]]
substrings = ["units"]
widget = { kind = "bounded_integer", min = 0, max = 30, default = 0 }

[[form.overrides]]
feature = "Gender"
widget = { kind = "binary", help = "0 = Female, 1 = Male" }

[labels]
positive = "Graduate"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.artifacts.model_path, "models/rf.onnx");
        assert_eq!(config.artifacts.onnx_threads, 4);
        assert_eq!(config.artifacts.scaler_path, "scaler.json");
        assert_eq!(config.form.rules.len(), 1);

        let selector = config.form.selector();
        assert_eq!(selector.select("Curricular_units_1st_sem_enrolled").name(), "bounded_integer");
        assert_eq!(
            selector.select("Gender"),
            WidgetKind::Binary {
                help: "0 = Female, 1 = Male".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_widget_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[[form.overrides]]
feature = "Age_at_enrollment"
widget = { kind = "bounded_integer", min = 60, max = 15, default = 20 }
"#,
        )
        .unwrap();

        let err = AppConfig::load_from_path(&path).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid form widget configuration"));
        assert!(message.contains("Age_at_enrollment"));
        assert!(message.contains("min 60 is greater than max 15"));
    }
}
