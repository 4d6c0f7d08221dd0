use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub blobs: BlobsConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub connectors: ConnectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Blob storage backend selection.
///
/// `backend = "fs"` stores blobs under a local directory; `backend = "s3"`
/// targets an S3-compatible service (MinIO via `endpoint_url`).
#[derive(Debug, Deserialize, Clone)]
pub struct BlobsConfig {
    pub backend: String,
    /// Local root directory (fs backend).
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Bucket name (s3 backend).
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// `"hash-confirmed"` (default) or `"timestamp"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Evaluation interval for `lakedrop watch`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_strategy() -> String {
    "hash-confirmed".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConnectorsConfig {
    /// File-drop connector instances, keyed by instance name.
    #[serde(default)]
    pub file_drop: HashMap<String, FileDropConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FileDropConfig {
    /// Directory to watch. Auto-created if missing.
    pub root: PathBuf,
    /// Source name used in source ids and blob keys.
    #[serde(default = "default_source_name")]
    pub source_name: String,
    #[serde(default)]
    pub recursive: bool,
    /// Extension allow-list (e.g. `[".md", ".txt"]`). Empty allows all.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_source_name() -> String {
    "file_drop".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.blobs.backend.as_str() {
        "fs" => {
            if config.blobs.root.is_none() {
                anyhow::bail!("blobs.root must be set when blobs.backend is 'fs'");
            }
        }
        "s3" => {
            if config.blobs.bucket.is_none() {
                anyhow::bail!("blobs.bucket must be set when blobs.backend is 's3'");
            }
        }
        other => anyhow::bail!("Unknown blob backend: '{}'. Must be fs or s3.", other),
    }

    match config.detector.strategy.as_str() {
        "hash-confirmed" | "timestamp" => {}
        other => anyhow::bail!(
            "Unknown detector strategy: '{}'. Must be hash-confirmed or timestamp.",
            other
        ),
    }

    if config.detector.poll_interval_secs == 0 {
        anyhow::bail!("detector.poll_interval_secs must be > 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("lakedrop.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn minimal_fs_config_parses_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
            [db]
            path = "data/lakedrop.sqlite"

            [blobs]
            backend = "fs"
            root = "data/blobs"

            [connectors.file_drop.inbox]
            root = "watch/inbox"
            "#,
        );

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.detector.strategy, "hash-confirmed");
        assert_eq!(cfg.detector.poll_interval_secs, 30);
        let inbox = &cfg.connectors.file_drop["inbox"];
        assert_eq!(inbox.source_name, "file_drop");
        assert!(!inbox.recursive);
        assert!(inbox.extensions.is_empty());
    }

    #[test]
    fn fs_backend_requires_root() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
            [db]
            path = "data/lakedrop.sqlite"

            [blobs]
            backend = "fs"
            "#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_strategy_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
            [db]
            path = "data/lakedrop.sqlite"

            [blobs]
            backend = "fs"
            root = "blobs"

            [detector]
            strategy = "mtime"
            "#,
        );
        assert!(load_config(&path).is_err());
    }
}
