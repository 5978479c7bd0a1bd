use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::parse_uuid;

#[derive(Clone)]
pub struct ChirpStore {
    pool: SqlitePool,
}

/// A short post owned by one user.
#[derive(Debug, Clone)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing order by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChirpOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(sqlx::FromRow)]
struct ChirpRow {
    id: String,
    body: String,
    user_id: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ChirpRow> for Chirp {
    type Error = sqlx::Error;

    fn try_from(row: ChirpRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            body: row.body,
            user_id: parse_uuid(&row.user_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect(rows: Vec<ChirpRow>) -> Result<Vec<Chirp>, sqlx::Error> {
    rows.into_iter().map(Chirp::try_from).collect()
}

impl ChirpStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a chirp. The body is stored as given.
    pub async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, sqlx::Error> {
        let id = Uuid::new_v4();
        let row: ChirpRow = sqlx::query_as(
            "INSERT INTO chirps (id, body, user_id) VALUES (?, ?, ?)
             RETURNING id, body, user_id, created_at, updated_at",
        )
        .bind(id.to_string())
        .bind(body)
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Chirp::try_from(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Chirp>, sqlx::Error> {
        let row: Option<ChirpRow> = sqlx::query_as(
            "SELECT id, body, user_id, created_at, updated_at FROM chirps WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Chirp::try_from).transpose()
    }

    /// List all chirps by creation time. Ties are broken by insertion order.
    pub async fn list(&self, order: ChirpOrder) -> Result<Vec<Chirp>, sqlx::Error> {
        let query = match order {
            ChirpOrder::Asc => {
                "SELECT id, body, user_id, created_at, updated_at FROM chirps
                 ORDER BY created_at ASC, rowid ASC"
            }
            ChirpOrder::Desc => {
                "SELECT id, body, user_id, created_at, updated_at FROM chirps
                 ORDER BY created_at DESC, rowid DESC"
            }
        };
        let rows: Vec<ChirpRow> = sqlx::query_as(query).fetch_all(&self.pool).await?;
        collect(rows)
    }

    /// List chirps of one author by creation time.
    pub async fn list_by_author(
        &self,
        author: Uuid,
        order: ChirpOrder,
    ) -> Result<Vec<Chirp>, sqlx::Error> {
        let query = match order {
            ChirpOrder::Asc => {
                "SELECT id, body, user_id, created_at, updated_at FROM chirps
                 WHERE user_id = ? ORDER BY created_at ASC, rowid ASC"
            }
            ChirpOrder::Desc => {
                "SELECT id, body, user_id, created_at, updated_at FROM chirps
                 WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
            }
        };
        let rows: Vec<ChirpRow> = sqlx::query_as(query)
            .bind(author.to_string())
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    /// Delete a chirp. Returns false if it did not exist.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.users().create("a@x.com", "hash").await.unwrap();

        let chirp = db.chirps().create(user.id, "hello world").await.unwrap();
        assert_eq!(chirp.body, "hello world");
        assert_eq!(chirp.user_id, user.id);

        let fetched = db.chirps().get(chirp.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, chirp.id);
        assert_eq!(fetched.body, "hello world");

        assert!(db.chirps().get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_for_unknown_user_fails() {
        let db = Database::open(":memory:").await.unwrap();
        assert!(db.chirps().create(Uuid::new_v4(), "orphan").await.is_err());
    }

    #[tokio::test]
    async fn test_list_order() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.users().create("a@x.com", "hash").await.unwrap();

        for body in ["one", "two", "three"] {
            db.chirps().create(user.id, body).await.unwrap();
        }

        let asc: Vec<_> = db
            .chirps()
            .list(ChirpOrder::Asc)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(asc, vec!["one", "two", "three"]);

        let desc: Vec<_> = db
            .chirps()
            .list(ChirpOrder::Desc)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(desc, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn test_list_by_author() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = db.users().create("a@x.com", "hash").await.unwrap();
        let bob = db.users().create("b@x.com", "hash").await.unwrap();

        db.chirps().create(alice.id, "a1").await.unwrap();
        db.chirps().create(bob.id, "b1").await.unwrap();
        db.chirps().create(alice.id, "a2").await.unwrap();

        let chirps = db
            .chirps()
            .list_by_author(alice.id, ChirpOrder::Desc)
            .await
            .unwrap();
        let bodies: Vec<_> = chirps.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["a2", "a1"]);
        assert!(chirps.iter().all(|c| c.user_id == alice.id));

        let none = db
            .chirps()
            .list_by_author(Uuid::new_v4(), ChirpOrder::Asc)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.users().create("a@x.com", "hash").await.unwrap();
        let chirp = db.chirps().create(user.id, "bye").await.unwrap();

        assert!(db.chirps().delete(chirp.id).await.unwrap());
        assert!(db.chirps().get(chirp.id).await.unwrap().is_none());
        assert!(!db.chirps().delete(chirp.id).await.unwrap());
    }
}
