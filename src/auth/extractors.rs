//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::credentials::extract_bearer;
use super::errors::AuthError;
use super::policy::{authenticate, authorize_service};
use super::state::{HasAuthBackend, HasServiceKey};

/// Extractor for endpoints that require a valid access token.
/// Yields the caller's principal ID.
pub struct Auth(pub Uuid);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state.jwt()).map(Auth)
    }
}

/// Extractor for endpoints called by the trusted payment service.
pub struct ServiceAuth;

impl<S> FromRequestParts<S> for ServiceAuth
where
    S: HasServiceKey + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize_service(&parts.headers, state.service_key()).map(|()| ServiceAuth)
    }
}

/// The raw bearer credential, unvalidated.
/// Used by refresh and revoke, where the bearer is an opaque refresh token.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer(&parts.headers)
            .map(|token| BearerToken(token.to_string()))
            .map_err(|e| {
                tracing::debug!("Rejected bearer credential: {}", e);
                AuthError::Unauthenticated
            })
    }
}
