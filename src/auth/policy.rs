//! Who is calling, and may they act on this resource.

use axum::http::HeaderMap;
use tracing::debug;
use uuid::Uuid;

use super::credentials::{extract_api_key, extract_bearer};
use super::errors::AuthError;
use crate::jwt::JwtConfig;

/// Resolve the caller from a bearer access token.
///
/// A missing header and a forged token give the same answer.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtConfig) -> Result<Uuid, AuthError> {
    let token = extract_bearer(headers).map_err(|e| {
        debug!("Rejected bearer credential: {}", e);
        AuthError::Unauthenticated
    })?;

    jwt.validate(token).map_err(|e| {
        debug!("Rejected access token: {}", e);
        AuthError::Unauthenticated
    })
}

/// Allow a mutation only when the caller owns the resource.
pub fn authorize_owner(principal: Uuid, owner: Uuid) -> Result<(), AuthError> {
    if principal == owner {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Check that the caller presents the configured service API key.
pub fn authorize_service(headers: &HeaderMap, expected_key: &str) -> Result<(), AuthError> {
    if expected_key.is_empty() {
        debug!("No service key configured, rejecting service call");
        return Err(AuthError::Unauthenticated);
    }

    let key = extract_api_key(headers).map_err(|e| {
        debug!("Rejected service credential: {}", e);
        AuthError::Unauthenticated
    })?;

    if constant_time_eq(key.as_bytes(), expected_key.as_bytes()) {
        Ok(())
    } else {
        debug!("Service key mismatch");
        Err(AuthError::Unauthenticated)
    }
}

/// Constant-time byte comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{AccessClaims, TOKEN_ISSUER, unix_now};
    use axum::http::{HeaderValue, header};

    fn auth_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_token() {
        let jwt = JwtConfig::new(b"test-secret-key-for-testing");
        let id = Uuid::new_v4();
        let token = jwt.issue_access_token(id).unwrap().token;

        let headers = auth_headers(&format!("Bearer {}", token));
        assert_eq!(authenticate(&headers, &jwt).unwrap(), id);
    }

    #[test]
    fn test_authenticate_failures_are_uniform() {
        let jwt = JwtConfig::new(b"test-secret-key-for-testing");
        let other = JwtConfig::new(b"another-secret-key-for-testing");
        let id = Uuid::new_v4();

        let valid = jwt.issue_access_token(id).unwrap().token;
        let forged = other.issue_access_token(id).unwrap().token;
        let now = unix_now().unwrap();
        let expired = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &AccessClaims {
                iss: TOKEN_ISSUER.to_string(),
                sub: id.to_string(),
                iat: now - 120,
                exp: now - 60,
            },
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret-key-for-testing"),
        )
        .unwrap();

        let cases = [
            HeaderMap::new(),
            auth_headers(&format!("ApiKey {}", valid)),
            auth_headers(&format!("Bearer {}", forged)),
            auth_headers(&format!("Bearer {}", expired)),
            auth_headers("Bearer not-a-token"),
            auth_headers(&valid),
        ];
        for headers in cases {
            assert!(matches!(
                authenticate(&headers, &jwt),
                Err(AuthError::Unauthenticated)
            ));
        }
    }

    #[test]
    fn test_authorize_owner() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(authorize_owner(a, a).is_ok());
        assert!(matches!(authorize_owner(a, b), Err(AuthError::Forbidden)));
    }

    #[test]
    fn test_authorize_service() {
        let key = "f271c81ff7084ee5b99a5091b42d486e";

        assert!(authorize_service(&auth_headers(&format!("ApiKey {}", key)), key).is_ok());
        assert!(matches!(
            authorize_service(&auth_headers("ApiKey wrong"), key),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            authorize_service(&auth_headers(&format!("Bearer {}", key)), key),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            authorize_service(&HeaderMap::new(), key),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn test_empty_service_key_never_authorizes() {
        assert!(matches!(
            authorize_service(&auth_headers("ApiKey "), ""),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            authorize_service(&auth_headers("ApiKey anything"), ""),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
        assert!(constant_time_eq(b"", b""));
    }
}
