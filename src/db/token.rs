//! Refresh token storage, lookup and revocation.
//!
//! Refresh tokens are opaque random strings that only mean something because
//! a row exists for them. A token is usable while it is neither revoked nor
//! expired; both conditions are terminal and checked on every use.

use rand::RngCore;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::parse_uuid;
use crate::jwt::unix_now;

/// Refresh token duration: 60 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 60 * 24 * 60 * 60;

/// Random bytes per refresh token (hex encoded to 64 characters).
const REFRESH_TOKEN_BYTES: usize = 32;

/// A stored refresh token record.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    /// Unix seconds
    pub expires_at: u64,
    /// Unix seconds, set once on first revocation
    pub revoked_at: Option<u64>,
    pub created_at: String,
}

impl RefreshToken {
    /// True iff the token is not revoked and `now` is before its expiry.
    pub fn is_usable(&self, now: u64) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token: String,
    user_id: String,
    expires_at: i64,
    revoked_at: Option<i64>,
    created_at: String,
}

impl TryFrom<RefreshTokenRow> for RefreshToken {
    type Error = sqlx::Error;

    fn try_from(row: RefreshTokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            token: row.token,
            user_id: parse_uuid(&row.user_id)?,
            expires_at: row.expires_at.max(0) as u64,
            revoked_at: row.revoked_at.map(|t| t.max(0) as u64),
            created_at: row.created_at,
        })
    }
}

/// Errors from resolving or revoking a refresh token.
#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Generate a new refresh token value: 32 random bytes, lowercase hex.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn now_secs() -> Result<u64, sqlx::Error> {
    unix_now().map_err(|e| sqlx::Error::Protocol(e.to_string()))
}

/// Store for refresh tokens.
pub struct RefreshTokenStore {
    pool: SqlitePool,
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and persist a fresh refresh token for a user, expiring in 60 days.
    pub async fn create(&self, user_id: Uuid) -> Result<RefreshToken, sqlx::Error> {
        let expires_at = now_secs()? + REFRESH_TOKEN_DURATION_SECS;
        self.create_with_expiry(user_id, &generate_refresh_token(), expires_at)
            .await
    }

    /// Persist a refresh token with an explicit value and expiry.
    ///
    /// Plain insert: an existing token value is an error, never overwritten.
    pub async fn create_with_expiry(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: u64,
    ) -> Result<RefreshToken, sqlx::Error> {
        let row: RefreshTokenRow = sqlx::query_as(
            "INSERT INTO refresh_tokens (token, user_id, expires_at, revoked_at)
             VALUES (?, ?, ?, NULL)
             RETURNING token, user_id, expires_at, revoked_at, created_at",
        )
        .bind(token)
        .bind(user_id.to_string())
        .bind(expires_at as i64)
        .fetch_one(&self.pool)
        .await?;
        RefreshToken::try_from(row)
    }

    /// Look up a token by its exact value.
    pub async fn get(&self, token: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            "SELECT token, user_id, expires_at, revoked_at, created_at
             FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RefreshToken::try_from).transpose()
    }

    /// Look up a token, failing with [`RefreshTokenError::NotFound`] if absent.
    pub async fn resolve(&self, token: &str) -> Result<RefreshToken, RefreshTokenError> {
        self.get(token).await?.ok_or(RefreshTokenError::NotFound)
    }

    /// Revoke a token. Revoking twice keeps the first revocation time.
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        let now = now_secs()?;
        let result = sqlx::query(
            "UPDATE refresh_tokens
             SET revoked_at = COALESCE(revoked_at, ?),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE token = ?",
        )
        .bind(now as i64)
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RefreshTokenError::NotFound);
        }
        Ok(())
    }

    /// Delete all expired tokens.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let now = now_secs()?;
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// List all tokens of a user, newest first.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<RefreshToken>, sqlx::Error> {
        let rows: Vec<RefreshTokenRow> = sqlx::query_as(
            "SELECT token, user_id, expires_at, revoked_at, created_at
             FROM refresh_tokens WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RefreshToken::try_from).collect()
    }
}
