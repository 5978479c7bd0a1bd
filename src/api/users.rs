use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use crate::auth::Auth;
use crate::db::{Database, User};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub passwords: Arc<PasswordHasher>,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/", post(create_user).put(update_user))
        .with_state(state)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl CredentialsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.email.is_empty() {
            return Err(ApiError::bad_request("Email is required"));
        }
        if self.password.is_empty() {
            return Err(ApiError::bad_request("Password is required"));
        }
        Ok(())
    }
}

/// Public view of a user. Never includes the password hash.
#[derive(Serialize)]
pub(super) struct UserResponse {
    id: String,
    created_at: String,
    updated_at: String,
    email: String,
    is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

async fn create_user(
    State(state): State<UsersState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;
    payload.validate()?;

    let hash = state
        .passwords
        .hash_blocking(payload.password)
        .await
        .internal_err("Failed to hash password")?;

    let user = state
        .db
        .users()
        .create(&payload.email, &hash)
        .await
        .map_err(|e| ApiError::from_write("Failed to create user", "User already exists", e))?;

    info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Replace the caller's email and password.
async fn update_user(
    State(state): State<UsersState>,
    Auth(user_id): Auth,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;
    payload.validate()?;

    let hash = state
        .passwords
        .hash_blocking(payload.password)
        .await
        .internal_err("Failed to hash password")?;

    let user = state
        .db
        .users()
        .update_credentials(user_id, &payload.email, &hash)
        .await
        .map_err(|e| ApiError::from_write("Failed to update user", "Email already in use", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %user.id, "User credentials updated");

    Ok(Json(UserResponse::from(user)))
}
