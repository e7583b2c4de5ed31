//! Schema migrations for the savings database.
//!
//! Each schema version `NN` has a pair of files in this directory: `migration_NN_up.sql` takes
//! the schema from `NN-1` to `NN` and `migration_NN_down.sql` takes it back.

use crate::Result;
use anyhow::{anyhow, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

struct Migration {
    version: i32,
    up: &'static str,
    down: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up: include_str!("migration_01_up.sql"),
    down: include_str!("migration_01_down.sql"),
}];

/// One script to apply and the version recorded once it has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    sql: &'static str,
    records: i32,
}

/// The schema version reached by applying every known migration.
pub(crate) fn latest_version() -> i32 {
    MIGRATIONS.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Moves the schema from version `from` to version `to`, upwards or downwards. Each step commits
/// together with its `schema_version` row, so an interrupted run leaves a consistent version.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Result<()> {
    let steps = plan(from, to)?;
    for step in &steps {
        debug!("Migrating schema to version {:02}", step.records);
        apply(pool, step).await?;
    }
    if !steps.is_empty() {
        debug!("Schema is at version {to}");
    }
    Ok(())
}

/// Lists the steps between two versions. Fails before anything runs if a migration is missing.
fn plan(from: i32, to: i32) -> Result<Vec<Step>> {
    let find = |version: i32| {
        MIGRATIONS
            .iter()
            .find(|m| m.version == version)
            .ok_or_else(|| anyhow!("No migration for schema version {version} ({from} -> {to})"))
    };
    if from <= to {
        ((from + 1)..=to)
            .map(|v| find(v).map(|m| Step { sql: m.up, records: v }))
            .collect()
    } else {
        ((to + 1)..=from)
            .rev()
            .map(|v| {
                find(v).map(|m| Step {
                    sql: m.down,
                    records: v - 1,
                })
            })
            .collect()
    }
}

async fn apply(pool: &SqlitePool, step: &Step) -> Result<()> {
    let mut tx = pool.begin().await.context("Unable to start a migration")?;
    tx.execute(step.sql)
        .await
        .with_context(|| format!("Migration to version {} failed", step.records))?;
    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(step.records)
        .execute(&mut *tx)
        .await
        .context("Unable to record the schema version")?;
    tx.commit().await.context("Unable to commit a migration")?;
    Ok(())
}

/// Creates the single-row `schema_version` table, at version 0, unless it already exists.
pub(crate) async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await.context("Unable to start bootstrapping")?;
    tx.execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .await
        .context("Unable to create the schema_version table")?;
    tx.execute(
        "INSERT INTO schema_version (version) \
         SELECT 0 WHERE NOT EXISTS (SELECT 1 FROM schema_version)",
    )
    .await
    .context("Unable to record schema version 0")?;
    tx.commit().await.context("Unable to finish bootstrapping")?;
    Ok(())
}

pub(crate) async fn schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Unable to read the schema version")?;
    version.context("The schema_version table is empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use tempfile::TempDir;

    async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let options = SqliteConnectOptions::new()
            .filename(temp_dir.path().join("test.sqlite"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create SQLite database")?;
        bootstrap(&pool).await?;
        Ok((temp_dir, pool))
    }

    async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .context("Failed to check table existence")?;
        Ok(row.0 > 0)
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        bootstrap(&pool).await.unwrap();
        assert_eq!(schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_migration_up_creates_storage() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        assert_eq!(schema_version(&pool).await.unwrap(), 0);

        run(&pool, 0, 1).await.unwrap();

        assert_eq!(schema_version(&pool).await.unwrap(), 1);
        assert!(table_exists(&pool, "storage").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_down_drops_storage() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();

        run(&pool, 1, 0).await.unwrap();

        assert_eq!(schema_version(&pool).await.unwrap(), 0);
        assert!(!table_exists(&pool, "storage").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_no_op_when_already_at_target() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();
        run(&pool, 1, 1).await.unwrap();
        assert_eq!(schema_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_storage_key_is_unique() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();

        sqlx::query("INSERT INTO storage (key, value) VALUES ('k', '[]')")
            .execute(&pool)
            .await
            .unwrap();
        let dup = sqlx::query("INSERT INTO storage (key, value) VALUES ('k', '{}')")
            .execute(&pool)
            .await;
        assert!(dup.is_err());
    }

    #[test]
    fn test_plan() {
        assert!(plan(1, 1).unwrap().is_empty());
        let up = plan(0, 1).unwrap();
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].records, 1);
        assert!(up[0].sql.contains("CREATE TABLE storage"));
        let down = plan(1, 0).unwrap();
        assert_eq!(down[0].records, 0);
        assert!(down[0].sql.contains("DROP TABLE"));
        assert!(plan(0, 2).is_err());
        assert!(plan(3, 1).is_err());
    }

    #[test]
    fn test_latest_version() {
        assert_eq!(latest_version(), 1);
    }
}
