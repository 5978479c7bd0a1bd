//! Login, refresh and revoke flows.
//!
//! Login always mints a brand-new refresh token. Refresh only mints an access
//! token and never rotates the refresh token it was given.

use tracing::{debug, info};

use super::errors::AuthError;
use super::state::HasAuthBackend;
use crate::db::{RefreshToken, RefreshTokenError, User};
use crate::jwt::{AccessTokenResult, unix_now};
use crate::password::PasswordHasher;

/// Everything a successful login hands back to the client.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: AccessTokenResult,
    pub refresh_token: RefreshToken,
}

/// Exchange an email and password for an access token and a fresh refresh token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login<S>(
    state: &S,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, AuthError>
where
    S: HasAuthBackend,
{
    let user = state
        .db()
        .users()
        .get_by_email(email)
        .await
        .map_err(|e| AuthError::internal("Failed to look up user", e))?;

    // An unknown email still pays for one verification
    let Some(user) = user else {
        hasher
            .verify_decoy_blocking(password.to_string())
            .await
            .map_err(|e| AuthError::internal("Failed to verify password", e))?;
        debug!("Login for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    let matches = hasher
        .verify_blocking(password.to_string(), user.hashed_password.clone())
        .await
        .map_err(|e| AuthError::internal("Failed to verify password", e))?;
    if !matches {
        debug!(user_id = %user.id, "Login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let access_token = state
        .jwt()
        .issue_access_token(user.id)
        .map_err(|e| AuthError::internal("Failed to issue access token", e))?;

    let refresh_token = state
        .db()
        .tokens()
        .create(user.id)
        .await
        .map_err(|e| AuthError::internal("Failed to store refresh token", e))?;

    info!(user_id = %user.id, "User logged in");

    Ok(LoginOutcome {
        user,
        access_token,
        refresh_token,
    })
}

/// Mint a new access token from a usable refresh token.
pub async fn refresh<S>(state: &S, token: &str) -> Result<AccessTokenResult, AuthError>
where
    S: HasAuthBackend,
{
    let record = match state.db().tokens().resolve(token).await {
        Ok(record) => record,
        Err(RefreshTokenError::NotFound) => {
            debug!("Refresh with unknown token");
            return Err(AuthError::Unauthenticated);
        }
        Err(RefreshTokenError::Storage(e)) => {
            return Err(AuthError::internal("Failed to look up refresh token", e));
        }
    };

    let now = unix_now().map_err(|e| AuthError::internal("Failed to read clock", e))?;
    if !record.is_usable(now) {
        debug!(user_id = %record.user_id, "Refresh with revoked or expired token");
        return Err(AuthError::Unauthenticated);
    }

    state
        .jwt()
        .issue_access_token(record.user_id)
        .map_err(|e| AuthError::internal("Failed to issue access token", e))
}

/// Revoke a refresh token. Revoking an already revoked token succeeds.
pub async fn revoke<S>(state: &S, token: &str) -> Result<(), RefreshTokenError>
where
    S: HasAuthBackend,
{
    state.db().tokens().revoke(token).await?;
    info!("Refresh token revoked");
    Ok(())
}
