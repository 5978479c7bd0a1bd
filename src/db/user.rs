use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::{DbError, parse_uuid};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// A registered principal.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    hashed_password: String,
    is_chirpy_red: i32,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            email: row.email,
            hashed_password: row.hashed_password,
            is_chirpy_red: row.is_chirpy_red != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. A taken email yields [`DbError::Conflict`].
    pub async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DbError> {
        let id = Uuid::new_v4();
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, email, hashed_password) VALUES (?, ?, ?)
             RETURNING id, email, hashed_password, is_chirpy_red, created_at, updated_at",
        )
        .bind(id.to_string())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;
        Ok(User::try_from(row)?)
    }

    /// Get a user by email (exact match).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, hashed_password, is_chirpy_red, created_at, updated_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, hashed_password, is_chirpy_red, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// Replace a user's email and password hash. Returns `None` if the user is gone.
    pub async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET email = ?, hashed_password = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?
             RETURNING id, email, hashed_password, is_chirpy_red, created_at, updated_at",
        )
        .bind(email)
        .bind(hashed_password)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from_write)?;
        Ok(row.map(User::try_from).transpose()?)
    }

    /// Mark a user as upgraded. Returns false if the user does not exist.
    pub async fn upgrade(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = 1,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every user. Tokens and chirps go with them.
    pub async fn delete_all(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
