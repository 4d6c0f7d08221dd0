//! In-memory [`BlobStore`] implementation for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::PipelineError;

use super::BlobStore;

/// In-memory blob store for testing.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored keys, sorted (test inspection).
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored objects (test inspection).
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().unwrap().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(key.to_string()).into())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.read().unwrap().contains_key(key))
    }
}
