//! Admin endpoints.
//!
//! - GET `/metrics` - HTML page with the file server hit count
//! - POST `/reset` - Delete all users and zero the counter (dev platform only)

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use tracing::{info, warn};

use crate::api::ApiError;
use crate::cli::Platform;
use crate::db::Database;
use crate::metrics::HitCounter;

#[derive(Clone)]
pub struct AdminState {
    pub db: Database,
    pub hits: HitCounter,
    pub platform: Platform,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/reset", post(reset))
        .with_state(state)
}

async fn metrics(State(state): State<AdminState>) -> impl IntoResponse {
    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>",
        state.hits.get()
    ))
}

async fn reset(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    if state.platform != Platform::Dev {
        warn!("Rejected reset outside the dev platform");
        return Err(ApiError::forbidden(
            "Reset endpoint is only available in dev environment",
        ));
    }

    let deleted = state
        .db
        .users()
        .delete_all()
        .await
        .map_err(|e| ApiError::db_error("Failed to delete users", e))?;
    state.hits.reset();

    info!(deleted, "Reset users and hit counter");

    Ok((StatusCode::OK, "Hits and users reset to 0"))
}
