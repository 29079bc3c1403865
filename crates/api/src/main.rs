use std::net::SocketAddr;
use std::sync::Arc;

use qspool_api::config::ServerConfig;
use qspool_api::registry::Registry;
use qspool_api::router::build_app_router;
use qspool_api::state::AppState;
use qspool_cloud::{build_storage, StorageConfig};
use qspool_core::queue::JobQueue;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qspool_api=debug,qspool_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Storage ---
    let storage_config = StorageConfig::from_env().expect("Invalid storage configuration");
    let storage = build_storage(&storage_config).await;
    let queue = JobQueue::new(storage);
    match queue.check_storage().await {
        Ok(()) => tracing::info!(provider = queue.storage().name(), "Storage reachable"),
        Err(e) => tracing::warn!(
            provider = queue.storage().name(),
            error = %e,
            "Storage not reachable at startup",
        ),
    }

    // --- Registry ---
    let registry = Registry::load(&config.registry_path).expect("Failed to load registry");
    tracing::info!(
        path = %config.registry_path.display(),
        users = registry.user_count(),
        backends = registry.backends().count(),
        "Registry loaded",
    );

    // --- App state ---
    let state = AppState {
        queue,
        registry: Arc::new(registry),
        config: Arc::new(config.clone()),
    };

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

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM (on Unix) to initiate graceful shutdown.
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
