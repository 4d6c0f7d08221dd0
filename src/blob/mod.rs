//! Raw blob storage.
//!
//! Blobs are write-once and content-addressed: the storage key embeds
//! the content hash, and already-known content is never rewritten. The
//! [`BlobStore`] trait abstracts the backend (local directory, S3, or
//! in-memory for tests).

pub mod fs;
pub mod memory;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::BlobsConfig;

/// Abstract blob backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes at a key. Overwrites are permitted but the pipeline
    /// never issues one for an already-ingested content hash.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Retrieve bytes by key. Fails if the key does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Storage key for a raw blob.
///
/// All segments are literal:
/// `raw/source=<source>/ingest_date=<YYYY-MM-DD>/run_id=<run_id>/sha256=<doc_id>/blob.bin`
pub fn blob_key(source: &str, ingest_date: NaiveDate, run_id: &str, doc_id: &str) -> String {
    format!(
        "raw/source={}/ingest_date={}/run_id={}/sha256={}/blob.bin",
        source,
        ingest_date.format("%Y-%m-%d"),
        run_id,
        doc_id
    )
}

/// Sibling manifest key at the same prefix, replacing `blob.bin`.
pub fn manifest_key(blob_key: &str) -> String {
    match blob_key.strip_suffix("blob.bin") {
        Some(prefix) => format!("{}manifest.json", prefix),
        None => format!("{}.manifest.json", blob_key),
    }
}

/// Build the configured blob backend.
pub fn from_config(config: &BlobsConfig) -> Result<Box<dyn BlobStore>> {
    match config.backend.as_str() {
        "fs" => {
            let root = config
                .root
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("blobs.root not configured"))?;
            Ok(Box::new(fs::FsBlobStore::new(root)?))
        }
        "s3" => Ok(Box::new(s3::S3BlobStore::from_config(config)?)),
        other => anyhow::bail!("Unknown blob backend: '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_scheme_matches_template() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let key = blob_key("file_drop", date, "run-1", "abc123");
        assert_eq!(
            key,
            "raw/source=file_drop/ingest_date=2025-03-09/run_id=run-1/sha256=abc123/blob.bin"
        );
    }

    #[test]
    fn manifest_is_sibling_of_blob() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let key = blob_key("file_drop", date, "run-1", "abc123");
        assert_eq!(
            manifest_key(&key),
            "raw/source=file_drop/ingest_date=2025-03-09/run_id=run-1/sha256=abc123/manifest.json"
        );
    }
}
