//! Core data models for the ingestion pipeline.
//!
//! These types flow between the connectors, the change detector, the
//! orchestrator, and the catalog. Timestamps persisted to the catalog
//! are Unix epoch seconds; the blob-store manifest carries ISO-8601.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An in-flight fetch result produced by a connector.
///
/// Created transiently on each fetch, consumed by the orchestrator and
/// discarded. Never persisted as-is.
#[derive(Debug, Clone)]
pub struct FetchedItem {
    /// Raw content bytes.
    pub content: Vec<u8>,
    /// Stable external identifier, e.g. `"file_drop::notes/a.md"`.
    pub source_id: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: Option<String>,
    pub etag: Option<String>,
    pub license: Option<String>,
    pub fetched_at: DateTime<Utc>,
    /// Free-form source-specific metadata, carried into the manifest.
    pub metadata: serde_json::Value,
}

/// Catalog row keyed by content identity.
///
/// Exactly one `Document` exists per distinct content hash, regardless
/// of how many times or from how many sources that content is observed.
#[derive(Debug, Clone)]
pub struct Document {
    /// Content hash (unique, immutable).
    pub doc_id: String,
    /// Source id of the first-seen fetch.
    pub source_id: String,
    pub mime: String,
    pub size_bytes: i64,
    /// Set once at first ingestion, never updated.
    pub ingest_first_at: i64,
    /// Updated on every re-observation.
    pub ingest_last_at: i64,
    pub url: Option<String>,
    pub license: Option<String>,
    pub hash_alg: String,
    /// Owned by downstream quality checks; ingestion only initializes it.
    pub dq_status: String,
}

/// Append-only observation record: one row per observation of a content
/// hash within a run. Never updated or deleted.
#[derive(Debug, Clone)]
pub struct DocVersion {
    pub doc_id: String,
    pub run_id: String,
    pub source_id: String,
    pub ingest_at: i64,
    pub etag: Option<String>,
}

/// Audit record tying a run's inputs to its outputs.
#[derive(Debug, Clone)]
pub struct LineageEvent {
    pub event_id: String,
    pub run_id: String,
    pub task_name: String,
    /// External ids consumed, in work-order order.
    pub input_ids: Vec<String>,
    /// Document ids produced or re-observed.
    pub output_ids: Vec<String>,
    pub event_time: i64,
    pub duration_ms: i64,
}

/// Externally observable summary of one orchestrator run.
///
/// Every discovered item is accounted for in exactly one of
/// `ingested`, `skipped`, or `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub discovered: u64,
    pub ingested: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Self-describing metadata object stored next to each blob.
///
/// Independent of the catalog, so raw storage can be recovered without
/// it. Field names are part of the on-store format.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub source_id: String,
    pub doc_id: String,
    pub mime: String,
    pub size_bytes: i64,
    /// ISO-8601 fetch timestamp.
    pub fetched_at: String,
    pub url: Option<String>,
    pub etag: Option<String>,
    pub license: Option<String>,
    /// Equal to `doc_id`.
    pub checksum: String,
    pub hash_alg: String,
    pub metadata: serde_json::Value,
}

impl Manifest {
    /// Build a manifest for a fetched item and its computed identity.
    pub fn for_item(item: &FetchedItem, doc_id: &str) -> Self {
        Self {
            source_id: item.source_id.clone(),
            doc_id: doc_id.to_string(),
            mime: item.mime_type.clone(),
            size_bytes: item.size_bytes,
            fetched_at: item.fetched_at.to_rfc3339(),
            url: item.url.clone(),
            etag: item.etag.clone(),
            license: item.license.clone(),
            checksum: doc_id.to_string(),
            hash_alg: crate::identity::HASH_ALG.to_string(),
            metadata: item.metadata.clone(),
        }
    }
}

/// Aggregate catalog counts surfaced by `lakedrop stats`.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub documents: i64,
    pub versions: i64,
    pub runs_total: i64,
    pub runs_completed: i64,
    pub lineage_events: i64,
}
