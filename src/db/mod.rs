//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! The database is a small key/value store: the ledger keeps each of its documents as a JSON
//! string under a fixed key in the `storage` table.

mod migrations;

use crate::ledger::Storage;
use crate::Result;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The SQLite database is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let current = migrations::schema_version(&pool).await?;
        let latest = migrations::latest_version();
        if current > latest {
            bail!(
                "The database schema version {current} is newer than this program supports \
                ({latest}). Is a newer version of savings available?"
            );
        }
        migrations::run(&pool, current, latest).await?;
        Ok(Self { pool })
    }

    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, migrations::latest_version()).await?;
        debug!("Created SQLite database at {}", path.display());
        Ok(Self { pool })
    }

    /// Moves everything in the write-ahead log into the main database file, so that the file can
    /// be copied on its own.
    pub(crate) async fn checkpoint(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .context("Failed to checkpoint the SQLite database")?;
        Ok(())
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}

#[async_trait::async_trait]
impl Storage for Db {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        trace!("get_item {key}");
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read storage key '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        trace!("set_item {key} ({} bytes)", value.len());
        sqlx::query(
            "INSERT INTO storage (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write storage key '{key}'"))?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        trace!("remove_item {key}");
        sqlx::query("DELETE FROM storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove storage key '{key}'"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("savings.sqlite");

        let db = Db::init(&path).await.unwrap();
        db.set_item("a", "1").await.unwrap();
        drop(db);

        let db = Db::load(&path).await.unwrap();
        assert_eq!(db.get_item("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("savings.sqlite");
        Db::init(&path).await.unwrap();
        assert!(Db::init(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let e = Db::load(dir.path().join("nope.sqlite")).await.unwrap_err();
        assert!(e.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_remove() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(dir.path().join("savings.sqlite")).await.unwrap();

        assert_eq!(db.get_item("k").await.unwrap(), None);
        db.set_item("k", "[]").await.unwrap();
        db.set_item("k", "[1]").await.unwrap();
        assert_eq!(db.get_item("k").await.unwrap().as_deref(), Some("[1]"));

        db.remove_item("k").await.unwrap();
        assert_eq!(db.get_item("k").await.unwrap(), None);
        // Removing a missing key is not an error.
        db.remove_item("k").await.unwrap();
    }
}
