//! Credential extraction from the `Authorization` header.
//!
//! Bearer tokens and API keys share the header but are separate trust
//! boundaries: each extractor only accepts its own literal prefix.

use axum::http::{HeaderMap, header};

/// Prefix for user credentials (access or refresh token).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Prefix for service credentials.
pub const API_KEY_PREFIX: &str = "ApiKey ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// No header, or nothing after the prefix
    #[error("missing credential")]
    Missing,
    /// The header carries another scheme
    #[error("wrong authorization scheme")]
    WrongScheme,
    /// The header value is not visible ASCII
    #[error("unreadable authorization header")]
    Unreadable,
}

fn extract_with_prefix<'a>(headers: &'a HeaderMap, prefix: &str) -> Result<&'a str, CredentialError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(CredentialError::Missing)?
        .to_str()
        .map_err(|_| CredentialError::Unreadable)?;

    if value.is_empty() {
        return Err(CredentialError::Missing);
    }

    let credential = value
        .strip_prefix(prefix)
        .ok_or(CredentialError::WrongScheme)?;

    if credential.is_empty() {
        return Err(CredentialError::Missing);
    }
    Ok(credential)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, CredentialError> {
    extract_with_prefix(headers, BEARER_PREFIX)
}

/// Extract the key from `Authorization: ApiKey <key>`.
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, CredentialError> {
    extract_with_prefix(headers, API_KEY_PREFIX)
}
