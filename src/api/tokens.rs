//! Session endpoints.
//!
//! - POST `/login` - Exchange email and password for an access and refresh token
//! - POST `/refresh` - Exchange a refresh token for a new access token
//! - POST `/revoke` - Revoke a refresh token

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use super::users::UserResponse;
use crate::auth::{BearerToken, session};
use crate::db::{Database, RefreshTokenError};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;

#[derive(Clone)]
pub struct TokensState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub passwords: Arc<PasswordHasher>,
}

impl_has_auth_backend!(TokensState);

pub fn router(state: TokensState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/revoke", post(revoke))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    /// Accepted for compatibility. Access tokens always live one hour.
    #[serde(default)]
    expires_in_seconds: Option<i64>,
}

#[derive(Serialize)]
struct LoginResponse {
    #[serde(flatten)]
    user: UserResponse,
    token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    token: String,
}

async fn login(
    State(state): State<TokensState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;

    if let Some(requested) = payload.expires_in_seconds {
        debug!("Ignoring requested token lifetime of {}s", requested);
    }

    let outcome = session::login(&state, &state.passwords, &payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(outcome.user),
        token: outcome.access_token.token,
        refresh_token: outcome.refresh_token.token,
    }))
}

async fn refresh(
    State(state): State<TokensState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, ApiError> {
    let access = session::refresh(&state, &token).await?;
    Ok(Json(RefreshResponse {
        token: access.token,
    }))
}

async fn revoke(
    State(state): State<TokensState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, ApiError> {
    match session::revoke(&state, &token).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RefreshTokenError::NotFound) => Err(ApiError::not_found("Refresh token not found")),
        Err(RefreshTokenError::Storage(e)) => {
            Err(ApiError::db_error("Failed to revoke refresh token", e))
        }
    }
}
