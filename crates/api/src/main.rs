use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carscan_api::config::ServerConfig;
use carscan_api::router::build_app_router;
use carscan_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "carscan_api=debug,carscan_pipeline=debug,carscan_storage=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        scans_dir = %config.scans_dir.display(),
        public_base_url = %config.public_base_url,
        "Loaded server configuration",
    );

    if !config.sample_model_path.exists() {
        tracing::warn!(
            path = %config.sample_model_path.display(),
            "Sample model not found; reconstructions will fail until it is provided",
        );
    }

    tokio::fs::create_dir_all(&config.scans_dir)
        .await
        .expect("Failed to create scans directory");

    // --- Job manager ---
    let state = AppState::from_config(&config);

    // Jobs still `processing` were orphaned by the previous process.
    match state.jobs.recover_interrupted().await {
        Ok(recovered) => tracing::info!(recovered, "Startup recovery complete"),
        Err(e) => tracing::error!(error = %e, "Startup recovery failed"),
    }

    let jobs = state.jobs.clone();
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining jobs");
    if jobs.shutdown(config.shutdown_timeout()).await {
        tracing::info!("Graceful shutdown complete");
    } else {
        tracing::warn!(
            remaining = jobs.dispatcher().in_flight(),
            "Shutdown timed out; unfinished jobs will be failed on next start",
        );
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
