//! Database module for TASKBOARD.
//!
//! This module provides SQLite connectivity through an sqlx pool and
//! migration management. Batch mutations rely on [`Database::begin`] as
//! their single atomic commit boundary, so only transactional backends are
//! supported.

mod schema;

pub use schema::MIGRATIONS;

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::{Result, TaskboardError};

/// Connection pool type used by every repository.
pub type DbPool = SqlitePool;

/// Transaction type handed out by [`Database::begin`].
pub type DbTransaction = Transaction<'static, Sqlite>;

/// Database wrapper for managing the connection pool and migrations.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open a database at the specified path.
    ///
    /// If the database file doesn't exist, it will be created.
    /// Migrations are automatically applied.
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening database at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| TaskboardError::DatabaseConnection(e.to_string()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open an in-memory database for testing.
    ///
    /// The pool holds a single connection so every query sees the same
    /// in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory database");
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| TaskboardError::DatabaseConnection(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| TaskboardError::DatabaseConnection(e.to_string()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Begin a new transaction.
    ///
    /// Dropping the transaction without committing rolls it back.
    pub async fn begin(&self) -> Result<DbTransaction> {
        self.pool
            .begin()
            .await
            .map_err(|e| TaskboardError::Database(e.to_string()))
    }

    /// Begin a transaction that holds the write lock from its first statement.
    ///
    /// Reads made inside it see the latest committed state, and no other
    /// writer can commit until it ends. Batch mutations read what they are
    /// about to overwrite through this transaction.
    pub async fn begin_immediate(&self) -> Result<DbTransaction> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| TaskboardError::Database(e.to_string()))
    }

    /// Close every connection in the pool.
    ///
    /// Any later query fails with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the current schema version.
    pub async fn schema_version(&self) -> Result<i64> {
        if !self.table_exists("schema_version").await? {
            return Ok(0);
        }

        let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        let current_version = self.schema_version().await?;

        if current_version as usize >= MIGRATIONS.len() {
            debug!("Database is up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating database from version {} to {}",
            current_version,
            MIGRATIONS.len()
        );

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version     INTEGER PRIMARY KEY,
                applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        for (i, migration) in MIGRATIONS.iter().enumerate().skip(current_version as usize) {
            let version = (i + 1) as i64;
            info!("Applying migration v{}", version);

            let mut tx = self.begin().await?;
            sqlx::raw_sql(migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            debug!("Migration v{} applied successfully", version);
        }

        info!(
            "Database migration complete (now at version {})",
            MIGRATIONS.len()
        );
        Ok(())
    }

    /// Check if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
        )
        .bind(table_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap() as usize, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_core_tables_exist() {
        let db = Database::open_in_memory().await.unwrap();

        for table in [
            "boards",
            "blocks",
            "board_members",
            "sharing",
            "categories",
            "category_boards",
        ] {
            assert!(db.table_exists(table).await.unwrap(), "missing {table}");
        }
        assert!(!db.table_exists("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().await.unwrap();
        let fk_enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[tokio::test]
    async fn test_transaction_rollback_on_drop() {
        let db = Database::open_in_memory().await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query(
                "INSERT INTO categories (id, name, user_id, team_id, create_at, update_at)
                 VALUES ('c1', 'Boards', 'u1', 't1', 0, 0)",
            )
            .execute(&mut *tx)
            .await
            .unwrap();
            // dropped without commit
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_immediate_transaction_commits() {
        let db = Database::open_in_memory().await.unwrap();

        let mut tx = db.begin_immediate().await.unwrap();
        sqlx::query(
            "INSERT INTO categories (id, name, user_id, team_id, create_at, update_at)
             VALUES ('c1', 'Boards', 'u1', 't1', 0, 0)",
        )
        .execute(&mut *tx)
        .await
        .unwrap();
        let seen: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(seen, 1);
        tx.commit().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_block_requires_existing_board() {
        let db = Database::open_in_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO blocks (id, board_id, block_type, title, fields, created_by, modified_by, create_at, update_at)
             VALUES ('b1', 'missing', 'card', 't', '{}', 'u', 'u', 0, 0)",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_file_database_reopens_without_remigrating() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");

        {
            let db = Database::open(&db_path, 2).await.unwrap();
            assert!(db.table_exists("boards").await.unwrap());
            db.close().await;
        }

        let db = Database::open(&db_path, 2).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap() as usize, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_queries() {
        let db = Database::open_in_memory().await.unwrap();
        db.close().await;
        assert!(db.begin().await.is_err());
    }
}
