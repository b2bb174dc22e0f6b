//! Student Status Predictor - Main Entry Point
//!
//! Loads the trained artifacts once and serves the prediction form over HTTP.

use anyhow::{Context, Result};
use student_status_predictor::{
    config::{AppConfig, LoggingConfig},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes first so logging can honor its level
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| student_status_predictor::config::DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    init_logging(&config.logging)?;

    info!("Starting Student Status Predictor");
    info!(
        config = %config_path,
        model = %config.artifacts.model_path,
        scaler = %config.artifacts.scaler_path,
        encoder = %config.artifacts.encoder_path,
        dataset = %config.artifacts.dataset_path,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config));

    server::run_server(&config.server, state).await
}

/// RUST_LOG wins over the configured level
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid log level: {}", logging.level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
