pub mod admin;
pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod metrics;
pub mod password;

use api::create_api_router;
use axum::{Router, middleware};
use cli::Platform;
use db::Database;
use jwt::JwtConfig;
use metrics::{HitCounter, count_hits};
use password::PasswordHasher;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing access tokens
    pub jwt_secret: Vec<u8>,
    /// API key the Polka webhook must present. Empty rejects every call.
    pub polka_key: String,
    /// Deployment platform
    pub platform: Platform,
    /// Directory served under /app/
    pub assets_dir: PathBuf,
    /// Password hasher with the configured cost
    pub passwords: PasswordHasher,
    /// Hit counter for /app/, shared with the admin endpoints
    pub hits: HitCounter,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));

    let api_router = create_api_router(
        config.db.clone(),
        jwt,
        Arc::new(config.passwords.clone()),
        Arc::from(config.polka_key.as_str()),
    );

    let admin_router = admin::router(admin::AdminState {
        db: config.db.clone(),
        hits: config.hits.clone(),
        platform: config.platform,
    });

    // Static files, counted
    let app_routes = Router::new()
        .nest_service("/app", ServeDir::new(&config.assets_dir))
        .layer(middleware::from_fn_with_state(
            config.hits.clone(),
            count_hits,
        ));

    Router::new()
        .nest("/api", api_router)
        .nest("/admin", admin_router)
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    init_cleanup(&config.db).await;

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
