//! Local-directory blob backend.
//!
//! Keys map directly to relative paths under the configured root. This
//! is the default backend for local deployments and tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::error::PipelineError;

use super::BlobStore;

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create blob root: {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write blob: {}", path.display()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(PipelineError::NotFound(key.to_string()).into());
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read blob: {}", path.display()))?;
        Ok(bytes)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path()).unwrap();

        store.put("raw/source=x/blob.bin", b"payload").await.unwrap();
        assert!(store.exists("raw/source=x/blob.bin").await.unwrap());
        assert_eq!(store.get("raw/source=x/blob.bin").await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn get_missing_key_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path()).unwrap();
        assert!(store.get("absent").await.is_err());
        assert!(!store.exists("absent").await.unwrap());
    }
}
