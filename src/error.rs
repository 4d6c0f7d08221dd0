//! Error taxonomy for the ingestion pipeline.
//!
//! Item-level failures are values of [`PipelineError`] and are caught at
//! the orchestrator's item loop, never aborting a whole run. Run-level
//! composition errors (opening the database, writing lineage) use
//! `anyhow` at the boundaries instead.

use thiserror::Error;

/// Classified failures produced by connectors, the change detector, and
/// the per-item ingestion path.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The watch root (or equivalent source) is missing or unreadable.
    /// Reduces to a no-work evaluation, never a crash.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// An item vanished between discovery and fetch.
    #[error("item not found: {0}")]
    NotFound(String),

    /// A single item could not be read. Isolated; the run continues.
    #[error("fetch failed for '{id}': {reason}")]
    FetchFailed { id: String, reason: String },

    /// The content bytes for an item could not be obtained for hashing.
    /// Treated exactly like [`PipelineError::FetchFailed`].
    #[error("identity computation failed for '{id}': {reason}")]
    IdentityComputationFailed { id: String, reason: String },

    /// A catalog statement failed mid-item. The item stays re-ingestible.
    #[error("catalog write failed: {0}")]
    CatalogWriteFailed(String),

    /// A blob or manifest write failed mid-item.
    #[error("blob write failed for '{key}': {reason}")]
    BlobWriteFailed { key: String, reason: String },

    /// Persisted cursor state did not parse. Fails closed: the detector
    /// proceeds as if no cursor existed.
    #[error("cursor state is corrupt: {0}")]
    CursorCorrupt(String),
}
