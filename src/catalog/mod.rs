//! Catalog persistence façade.
//!
//! The [`CatalogStore`] trait owns the schema contract between the
//! change detector and the ingestion orchestrator, enabling pluggable
//! backends (SQLite for deployments, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogStats, DocVersion, Document, LineageEvent};

/// Abstract catalog backend.
///
/// The detector only reads (`confirmed_hashes`, cursor access); the
/// orchestrator is the sole writer of document, version, run, and
/// lineage state.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_document`](CatalogStore::find_document) | Look up a document by content hash |
/// | [`insert_document`](CatalogStore::insert_document) | Insert-if-absent; atomic under concurrent attempts |
/// | [`touch_last_seen`](CatalogStore::touch_last_seen) | Update `ingest_last_at` on re-observation |
/// | [`insert_version`](CatalogStore::insert_version) | Append one observation record |
/// | [`confirmed_hashes`](CatalogStore::confirmed_hashes) | Hashes durably recorded by completed runs |
/// | [`begin_run`](CatalogStore::begin_run) / [`complete_run`](CatalogStore::complete_run) | Run lifecycle bookkeeping |
/// | [`record_lineage`](CatalogStore::record_lineage) | Append one lineage event |
/// | [`load_cursor`](CatalogStore::load_cursor) / [`store_cursor`](CatalogStore::store_cursor) | Timestamp-strategy cursor state |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a document by its content hash.
    async fn find_document(&self, doc_id: &str) -> Result<Option<Document>>;

    /// Insert a document row if no row exists for its content hash.
    ///
    /// Returns `true` if a row was created, `false` if the hash was
    /// already present. Must be atomic under concurrent attempts: of two
    /// racing inserts for the same hash, exactly one returns `true`.
    async fn insert_document(&self, doc: &Document) -> Result<bool>;

    /// Update `ingest_last_at` for an existing document.
    /// `ingest_first_at` is never touched.
    async fn touch_last_seen(&self, doc_id: &str, at: i64) -> Result<()>;

    /// Append one observation record. Append-only: never updates.
    async fn insert_version(&self, version: &DocVersion) -> Result<()>;

    /// The set of content hashes with at least one version record tied
    /// to a *completed* run, optionally restricted to one source.
    ///
    /// This is the ground truth for "already ingested": a crash between
    /// the document insert and run completion leaves the hash out of
    /// this set, so the next evaluation re-emits it.
    async fn confirmed_hashes(&self, source: Option<&str>) -> Result<HashSet<String>>;

    /// Record the start of an orchestrator run.
    async fn begin_run(&self, run_id: &str, source: &str, at: i64) -> Result<()>;

    /// Mark a run as durably completed.
    async fn complete_run(&self, run_id: &str, at: i64) -> Result<()>;

    /// Append one lineage event.
    async fn record_lineage(&self, event: &LineageEvent) -> Result<()>;

    /// Load the persisted cursor state for a source (timestamp strategy).
    async fn load_cursor(&self, source: &str) -> Result<Option<String>>;

    /// Replace the persisted cursor state for a source.
    async fn store_cursor(&self, source: &str, state: &str, at: i64) -> Result<()>;

    /// Aggregate counts for the stats command.
    async fn stats(&self) -> Result<CatalogStats>;
}
