//! Startup helpers for the conversation explorer server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::config::{ArchiveConfig, ServerConfig};
use crate::server::{self, AppState};

/// Install the `tracing` subscriber (`RUST_LOG` aware, `info` by default).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Run the server (used by the `explorer-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting conversation explorer v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };
    let port = ServerConfig::from_env().port;

    // One request at a time; the store is read-only once warmed.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Build application state from the environment and warm the store.
///
/// # Errors
/// Returns an error if the configuration is invalid.
pub fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let archive = ArchiveConfig::from_env();
    let server_config = ServerConfig::from_env();
    archive.validate()?;
    server_config.validate()?;

    tracing::info!("Data directory: {}", archive.data_dir.display());

    let state = AppState::new(&archive, &server_config);
    state.store.ensure_loaded();
    Ok(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl+C handler failed: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
