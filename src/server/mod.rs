//! Web server for the predictor.
//!
//! Serves the HTML form page and a small JSON API over the same shared,
//! read-only artifact bundle.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::PredictRequest;
pub use state::{AppState, Predictor};

use crate::config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Bind and serve until ctrl+c
pub async fn run_server(config: &ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let ready = state.is_ready();
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        artifacts_loaded = ready,
        pid = std::process::id(),
        "Server listening"
    );
    info!(url = %format!("http://{}", addr), "Predictor page available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let started_at = chrono::Utc::now();
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(started_at);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
