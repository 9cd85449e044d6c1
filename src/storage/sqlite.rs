//! Durable store backed by SQLite via sqlx.
//!
//! The schema is created idempotently at open. There is no migration
//! framework here, just the one table.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use super::{SchoolStore, StorageError, StorageKind};
use crate::school::{NewSchool, School};

const CREATE_SCHOOLS_TABLE: &str = "\
    CREATE TABLE IF NOT EXISTS schools (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        created_at TEXT NOT NULL
    )";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub async fn open(db_path: &Path) -> Result<Self, StorageError> {
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::query(CREATE_SCHOOLS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// The underlying pool (Arc-backed, cheap to clone).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }
}

#[async_trait]
impl SchoolStore for SqliteStore {
    async fn insert(&self, school: &NewSchool) -> Result<School, StorageError> {
        let created_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO schools (name, address, latitude, longitude, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&school.name)
        .bind(&school.address)
        .bind(school.latitude)
        .bind(school.longitude)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        let row = sqlx::query_as("SELECT * FROM schools WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_all(&self) -> Result<Vec<School>, StorageError> {
        Ok(sqlx::query_as("SELECT * FROM schools ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Sqlite
    }
}
