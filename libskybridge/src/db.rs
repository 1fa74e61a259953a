//! The persisted seen-set
//!
//! One SQLite table keyed by the source post identifier. The set is
//! append-only: `record` uses insert-or-ignore semantics, so duplicate
//! inserts are no-ops and an identifier can never be re-published.
//! The pool is safe to share between the poll loop and the HTTP
//! request handlers.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::SeenRecord;

#[derive(Clone)]
pub struct SeenStore {
    pool: SqlitePool,
}

impl SeenStore {
    /// Open (or create) the seen-set database at the given path.
    pub async fn open(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Use forward slashes for the SQLite URL (works on both Windows and
        // Unix) and mode=rwc so the file is created if it doesn't exist.
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Open an in-memory store. Used by tests and available to callers
    /// that want a throwaway instance.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Exact-match lookup. Unknown identifiers return false, never an error.
    pub async fn contains(&self, source_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM seen_posts WHERE source_id = ?")
            .bind(source_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.is_some())
    }

    /// Idempotent insert. If the identifier already exists the call is a
    /// no-op; an existing row is never updated.
    pub async fn record(&self, source_id: &str, published_text: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO seen_posts (source_id, published_text, recorded_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(source_id)
        .bind(published_text)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// The most recently recorded entries, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<SeenRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT source_id, published_text, recorded_at
            FROM seen_posts
            ORDER BY recorded_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(rows
            .iter()
            .map(|r| SeenRecord {
                source_id: r.get("source_id"),
                published_text: r.get("published_text"),
                recorded_at: r.get("recorded_at"),
            })
            .collect())
    }

    /// Total number of recorded identifiers.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM seen_posts")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.get("n"))
    }
}
