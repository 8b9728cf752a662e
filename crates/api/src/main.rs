use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagen_api::config::ServerConfig;
use mediagen_api::registry::UploadRegistry;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_api::tracker::JobTracker;
use mediagen_runninghub::{AsyncJobClient, RunningHubConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediagen_api=debug,mediagen_runninghub=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let features: Vec<String> = config.enabled_features().map(|f| f.to_string()).collect();
    if features.is_empty() {
        tracing::warn!("No WORKFLOW_<FEATURE> configured; every generation route will 404");
    } else {
        tracing::info!(features = %features.join(","), "Enabled generation features");
    }

    // --- Vendor client ---
    let vendor_config = RunningHubConfig::from_env().expect("Invalid RunningHub configuration");
    tracing::info!(base_url = %vendor_config.base_url, "Loaded RunningHub configuration");
    config
        .check_submission_budget(vendor_config.submission_budget())
        .expect("REQUEST_TIMEOUT_SECS too short for vendor submissions");
    let client = Arc::new(
        AsyncJobClient::new(vendor_config).expect("Failed to build RunningHub client"),
    );

    // --- Job tracker ---
    let tracker = Arc::new(JobTracker::new(Duration::from_secs(
        config.shutdown_timeout_secs,
    )));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        client,
        tracker: Arc::clone(&tracker),
        uploads: Arc::new(UploadRegistry::new()),
    };

    // --- Router ---
    let app = build_app_router(state, &config).expect("Invalid router configuration");

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
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop polling tasks; the vendor keeps running the jobs themselves.
    tracker.shutdown().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
