use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tessera_core::store::{CredentialStore, SessionStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessera_api::auth::jwt::TokenSigner;
use tessera_api::auth::service::SessionManager;
use tessera_api::background::session_retention;
use tessera_api::config::ServerConfig;
use tessera_api::router::build_app_router;
use tessera_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Stores ---
    let (credentials, sessions) = build_stores(&config).await;

    // --- Session manager ---
    let signer = Arc::new(TokenSigner::new(&config.jwt));
    let manager = Arc::new(SessionManager::new(
        credentials,
        Arc::clone(&sessions),
        signer,
    ));

    // --- Session retention ---
    let retention_cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(session_retention::run(
        Arc::clone(&sessions),
        config.session_retention_hours,
        session_retention::CLEANUP_INTERVAL,
        retention_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState { sessions: manager };

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
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Session retention job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Connect the PostgreSQL backend when `DATABASE_URL` is set, otherwise fall
/// back to the in-memory stores.
///
/// Panics on database failures: there is nothing useful to serve without
/// the configured backend.
async fn build_stores(config: &ServerConfig) -> (Arc<dyn CredentialStore>, Arc<dyn SessionStore>) {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory stores (state is lost on restart)");
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(tessera_db::memory::MemoryCredentialStore::new());
        let sessions: Arc<dyn SessionStore> =
            Arc::new(tessera_db::memory::MemorySessionStore::new());
        return (credentials, sessions);
    };

    let pool = tessera_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    tessera_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    tessera_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(tessera_db::store::PgCredentialStore::new(pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(tessera_db::store::PgSessionStore::new(pool));
    (credentials, sessions)
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
