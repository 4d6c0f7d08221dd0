//! Catalog database connection.
//!
//! One SQLite file holds the whole catalog. WAL journaling lets a
//! `scan` read while a `run` writes; the busy timeout makes overlapping
//! commands back off instead of failing with `SQLITE_BUSY`. The parent
//! directory is created on first open so `init` works on a fresh
//! deployment.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create catalog directory: {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open catalog database: {}", db_path.display()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlobsConfig, Config, DbConfig};
    use std::path::PathBuf;

    fn config(path: PathBuf) -> Config {
        Config {
            db: DbConfig { path },
            blobs: BlobsConfig {
                backend: "fs".to_string(),
                root: Some(PathBuf::from("blobs")),
                bucket: None,
                region: "us-east-1".to_string(),
                endpoint_url: None,
            },
            detector: Default::default(),
            connectors: Default::default(),
        }
    }

    #[tokio::test]
    async fn connect_creates_missing_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/data/catalog.sqlite");

        let pool = connect(&config(path.clone())).await.unwrap();
        assert!(path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn reopening_an_existing_catalog_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path().join("catalog.sqlite"));

        let pool = connect(&cfg).await.unwrap();
        pool.close().await;
        let pool = connect(&cfg).await.unwrap();
        pool.close().await;
    }
}
