//! Application state shared across handlers

use crate::config::AppConfig;
use crate::form::InputForm;
use crate::models::{ArtifactLoader, InferenceEngine};
use tracing::{error, info};

use super::error::ServerError;

/// Everything a request needs once the artifacts are loaded
#[derive(Debug, Clone)]
pub struct Predictor {
    pub engine: InferenceEngine,
    pub form: InputForm,
    /// Label presented with positive framing
    pub positive_label: String,
}

/// Application state: either serving predictions or halted on a load error
#[derive(Debug, Clone)]
pub enum AppState {
    Ready(Box<Predictor>),
    /// Artifact load failed; every page shows only this message
    Unavailable(String),
}

impl AppState {
    pub fn ready(engine: InferenceEngine, form: InputForm, positive_label: impl Into<String>) -> Self {
        AppState::Ready(Box::new(Predictor {
            engine,
            form,
            positive_label: positive_label.into(),
        }))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        AppState::Unavailable(message.into())
    }

    /// Load the artifacts named in `config` and build the form and engine.
    ///
    /// A load failure does not abort startup; the state is left unavailable so
    /// the pages can report it.
    pub fn from_config(config: &AppConfig) -> Self {
        let loader = ArtifactLoader::from_config(&config.artifacts);
        match loader.load() {
            Ok(bundle) => {
                let form = InputForm::build(&bundle.schema, &config.form.selector());
                info!(fields = form.fields().len(), "Input form built");
                let engine = InferenceEngine::new(bundle, &config.labels);
                Self::ready(engine, form, config.labels.positive.clone())
            }
            Err(e) => {
                error!(path = %e.path().display(), error = %e, "Failed to load model/data files");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn predictor(&self) -> Result<&Predictor, ServerError> {
        match self {
            AppState::Ready(predictor) => Ok(predictor),
            AppState::Unavailable(message) => Err(ServerError::Unavailable(message.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AppState::Ready(_))
    }
}
