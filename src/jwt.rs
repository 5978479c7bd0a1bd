//! Access token generation and validation.
//!
//! Access tokens are HS256 JWTs carrying only `iss`, `sub`, `iat` and `exp`.
//! They are never stored, so they cannot be revoked; the one hour lifetime
//! bounds how long a leaked token stays useful. Revocable sessions live in
//! [`crate::db::RefreshTokenStore`].

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Issuer written into and required from every access token.
pub const TOKEN_ISSUER: &str = "chirpy";

/// Access token duration: 1 hour. Clients cannot ask for a different lifetime.
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer
    pub iss: String,
    /// Subject (principal UUID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue an access token with the fixed one hour lifetime.
    pub fn issue_access_token(&self, principal_id: Uuid) -> Result<AccessTokenResult, JwtError> {
        self.issue(principal_id, Duration::from_secs(ACCESS_TOKEN_DURATION_SECS))
    }

    /// Issue an access token for `principal_id` valid for `ttl`.
    pub fn issue(&self, principal_id: Uuid, ttl: Duration) -> Result<AccessTokenResult, JwtError> {
        let now = unix_now()?;
        // Round partial seconds up so a positive ttl never yields exp == iat
        let ttl_secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        let exp = now.saturating_add(ttl_secs);

        let claims = AccessClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: principal_id.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Validate an access token and return the principal it was issued to.
    pub fn validate(&self, token: &str) -> Result<Uuid, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expired from the second named in exp onwards
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::from_decode)?;

        Uuid::parse_str(&token_data.claims.sub).map_err(|_| JwtError::MalformedToken)
    }
}

/// Errors that can occur during JWT operations.
///
/// Callers at the HTTP boundary must collapse every validation variant into
/// one "unauthenticated" answer.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Error encoding the token
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    /// Signature does not match, or the token was signed with another algorithm
    #[error("invalid token signature")]
    InvalidSignature,
    /// Issuer claim is not ours
    #[error("wrong token issuer")]
    WrongIssuer,
    /// Token expiry has passed
    #[error("token expired")]
    TokenExpired,
    /// Token could not be parsed
    #[error("malformed token")]
    MalformedToken,
    /// System time error
    #[error("system time error")]
    TimeError,
}

impl JwtError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => JwtError::InvalidSignature,
            ErrorKind::InvalidIssuer => JwtError::WrongIssuer,
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::MalformedToken,
        }
    }
}
