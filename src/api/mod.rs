mod chirps;
mod error;
mod tokens;
mod users;
mod webhooks;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;

pub use chirps::{MAX_CHIRP_LENGTH, clean_body};
pub use error::ApiError;
pub use webhooks::USER_UPGRADED_EVENT;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    passwords: Arc<PasswordHasher>,
    polka_key: Arc<str>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
        passwords: passwords.clone(),
    };

    let tokens_state = tokens::TokensState {
        db: db.clone(),
        jwt: jwt.clone(),
        passwords,
    };

    let chirps_state = chirps::ChirpsState {
        db: db.clone(),
        jwt,
    };

    let webhooks_state = webhooks::WebhooksState { db, polka_key };

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/users", users::router(users_state))
        .nest("/chirps", chirps::router(chirps_state))
        .nest("/polka", webhooks::router(webhooks_state))
        .merge(tokens::router(tokens_state))
}

async fn healthz() -> &'static str {
    "OK"
}
