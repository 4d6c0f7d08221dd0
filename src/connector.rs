//! Source connector contract.
//!
//! A connector enumerates candidate items from an external source and
//! fetches their bytes plus basic metadata. The change detector and the
//! orchestrator only ever talk to sources through this trait, so new
//! source kinds (HTTP feeds, buckets) slot in without touching either.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::config::Config;
use crate::connector_fs::FileDropConnector;
use crate::error::PipelineError;
use crate::models::FetchedItem;

/// A data source that produces items for ingestion.
///
/// # Contract
///
/// - [`discover`](Connector::discover) is a finite, restartable
///   enumeration: each call performs a fresh scan.
/// - [`fetch`](Connector::fetch) fails with
///   [`PipelineError::NotFound`] if the item vanished between discovery
///   and fetch.
/// - [`fingerprint`](Connector::fingerprint) returns an opaque string
///   used only by the weaker timestamp-based change test; content
///   identity is always computed from fetched bytes.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Instance name (e.g. `"inbox"`).
    fn name(&self) -> &str;

    /// One-line description for the sources listing.
    fn description(&self) -> &str;

    /// Source name used in source ids and blob keys (e.g. `"file_drop"`).
    fn source(&self) -> &str;

    /// Enumerate external ids currently visible in the source.
    async fn discover(&self) -> Result<Vec<String>, PipelineError>;

    /// Fetch one item by external id.
    async fn fetch(&self, external_id: &str) -> Result<FetchedItem, PipelineError>;

    /// Cheap change fingerprint for one item (mtime + size for files).
    async fn fingerprint(&self, external_id: &str) -> Result<String, PipelineError>;

    /// Discover and fetch everything, isolating per-item fetch failures:
    /// a failed fetch is logged and skipped, enumeration continues.
    async fn fetch_all(&self) -> Result<Vec<FetchedItem>, PipelineError> {
        let mut items = Vec::new();
        for external_id in self.discover().await? {
            match self.fetch(&external_id).await {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(external_id = %external_id, error = %e, "fetch failed, skipping item");
                }
            }
        }
        Ok(items)
    }
}

/// Registry of configured connector instances.
pub struct ConnectorRegistry {
    connectors: Vec<Box<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: Vec::new(),
        }
    }

    /// Build a registry pre-loaded with every connector instance in the
    /// config file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for (name, cfg) in &config.connectors.file_drop {
            registry.register(Box::new(FileDropConnector::new(name.clone(), cfg.clone())?));
        }
        Ok(registry)
    }

    pub fn register(&mut self, connector: Box<dyn Connector>) {
        self.connectors.push(connector);
    }

    pub fn connectors(&self) -> &[Box<dyn Connector>] {
        &self.connectors
    }

    /// Find a connector by instance name.
    pub fn find(&self, name: &str) -> Option<&dyn Connector> {
        self.connectors
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
