//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Outcome of a failed authentication or authorization check.
///
/// Every way a credential can be bad collapses into `Unauthenticated`, so
/// callers never learn which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    Unauthenticated,
    /// Unknown email or wrong password on login
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,
    /// Hashing, signing or storage failure. Carries detail for the log only.
    #[error("internal authentication failure: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "Unauthorized",
            AuthError::InvalidCredentials => "Incorrect email or password",
            AuthError::Forbidden => "Forbidden",
            AuthError::Internal(_) => "Internal server error",
        }
    }

    pub(crate) fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        AuthError::Internal(format!("{}: {}", context, e))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!("{}", detail);
        }
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
