//! AdminGuard gateway binary.
//!
//! Usage: `adminguard-gateway [CONFIG]` (defaults to `adminguard.yaml`).
//! Log verbosity follows `RUST_LOG`.

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use adminguard_core::error::{AdminGuardError, Result};
use adminguard_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "adminguard-gateway exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::path_from_args(std::env::args());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|e| {
        AdminGuardError::BadRequest(format!("gateway.listen must be a socket address: {e}"))
    })?;

    let (state, workers) = AppState::from_config(&cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "adminguard-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AdminGuardError::Internal(format!("bind {listen} failed: {e}")))?;

    let draining = state.clone();
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested; draining");
            draining.set_draining();
        })
        .await
        .map_err(|e| AdminGuardError::Internal(format!("server failed: {e}")))?;

    // Closing the last queue sender lets workers finish pending jobs and exit.
    drop(state);
    workers.join().await;
    tracing::info!("adminguard-gateway stopped");
    Ok(())
}
