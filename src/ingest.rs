//! Ingestion orchestration.
//!
//! Executes one work order as a single run with per-item isolation and
//! content-addressed dedup. For new content the blob and manifest are
//! written before the catalog row; "seen" is only ever derived from
//! version records of completed runs, so a crash between any two steps
//! leaves the item re-ingestible rather than falsely marked seen.

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::blob::{blob_key, manifest_key, BlobStore};
use crate::catalog::CatalogStore;
use crate::connector::Connector;
use crate::error::PipelineError;
use crate::identity::{compute_doc_id, HASH_ALG};
use crate::models::{DocVersion, Document, LineageEvent, Manifest, RunStats};

/// Per-item result inside a run.
enum ItemOutcome {
    /// New content: blob written, document row created.
    Ingested(String),
    /// Already-known content: metadata-only update.
    AlreadyKnown(String),
}

/// Execute one work order as a single run.
///
/// Item processing order does not affect the final catalog state; each
/// item's outcome depends only on its own content hash. Item-level
/// failures are counted under `errors` and never abort the run.
pub async fn run_ingest(
    connector: &dyn Connector,
    catalog: &dyn CatalogStore,
    blobs: &dyn BlobStore,
    work_order: &[String],
) -> Result<RunStats> {
    let run_id = Uuid::new_v4().to_string();
    let started = Utc::now();
    catalog
        .begin_run(&run_id, connector.source(), started.timestamp())
        .await?;

    info!(run_id = %run_id, items = work_order.len(), "run started");

    let mut stats = RunStats::default();
    let mut output_ids = Vec::new();

    for external_id in work_order {
        stats.discovered += 1;

        match ingest_item(connector, catalog, blobs, &run_id, external_id).await {
            Ok(ItemOutcome::Ingested(doc_id)) => {
                stats.ingested += 1;
                output_ids.push(doc_id);
            }
            Ok(ItemOutcome::AlreadyKnown(doc_id)) => {
                stats.skipped += 1;
                output_ids.push(doc_id);
            }
            Err(e) => {
                error!(external_id = %external_id, error = %e, "item failed");
                stats.errors += 1;
            }
        }
    }

    let finished = Utc::now();
    catalog
        .record_lineage(&LineageEvent {
            event_id: Uuid::new_v4().to_string(),
            run_id: run_id.clone(),
            task_name: format!("ingest_{}", connector.source()),
            input_ids: work_order.to_vec(),
            output_ids,
            event_time: finished.timestamp(),
            duration_ms: (finished - started).num_milliseconds(),
        })
        .await?;

    // Only now do this run's version records count as confirmed.
    catalog.complete_run(&run_id, finished.timestamp()).await?;

    info!(
        run_id = %run_id,
        ingested = stats.ingested,
        skipped = stats.skipped,
        errors = stats.errors,
        "run complete"
    );

    Ok(stats)
}

/// Process a single work-order item.
///
/// Steps: fetch → hash → dedup lookup → (new) blob + manifest + document
/// row, or (known) touch last-seen → version record. Every failure maps
/// to a [`PipelineError`] so the caller can isolate it.
async fn ingest_item(
    connector: &dyn Connector,
    catalog: &dyn CatalogStore,
    blobs: &dyn BlobStore,
    run_id: &str,
    external_id: &str,
) -> Result<ItemOutcome, PipelineError> {
    let item = connector.fetch(external_id).await?;
    let doc_id = compute_doc_id(&item.content);
    let now = Utc::now();

    let existing = catalog
        .find_document(&doc_id)
        .await
        .map_err(|e| PipelineError::CatalogWriteFailed(e.to_string()))?;

    let outcome = if existing.is_none() {
        let key = blob_key(connector.source(), now.date_naive(), run_id, &doc_id);
        blobs
            .put(&key, &item.content)
            .await
            .map_err(|e| PipelineError::BlobWriteFailed {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        let manifest = Manifest::for_item(&item, &doc_id);
        let manifest_key = manifest_key(&key);
        let manifest_bytes =
            serde_json::to_vec_pretty(&manifest).map_err(|e| PipelineError::BlobWriteFailed {
                key: manifest_key.clone(),
                reason: e.to_string(),
            })?;
        blobs
            .put(&manifest_key, &manifest_bytes)
            .await
            .map_err(|e| PipelineError::BlobWriteFailed {
                key: manifest_key.clone(),
                reason: e.to_string(),
            })?;

        let inserted = catalog
            .insert_document(&Document {
                doc_id: doc_id.clone(),
                source_id: item.source_id.clone(),
                mime: item.mime_type.clone(),
                size_bytes: item.size_bytes,
                ingest_first_at: now.timestamp(),
                ingest_last_at: now.timestamp(),
                url: item.url.clone(),
                license: item.license.clone(),
                hash_alg: HASH_ALG.to_string(),
                dq_status: "pending".to_string(),
            })
            .await
            .map_err(|e| PipelineError::CatalogWriteFailed(e.to_string()))?;

        if inserted {
            info!(external_id = %external_id, doc_id = %doc_id, "ingested new document");
            ItemOutcome::Ingested(doc_id.clone())
        } else {
            // Lost an insert race with a concurrent run: demote to the
            // already-known path.
            catalog
                .touch_last_seen(&doc_id, now.timestamp())
                .await
                .map_err(|e| PipelineError::CatalogWriteFailed(e.to_string()))?;
            info!(external_id = %external_id, doc_id = %doc_id, "document created concurrently");
            ItemOutcome::AlreadyKnown(doc_id.clone())
        }
    } else {
        catalog
            .touch_last_seen(&doc_id, now.timestamp())
            .await
            .map_err(|e| PipelineError::CatalogWriteFailed(e.to_string()))?;
        info!(external_id = %external_id, doc_id = %doc_id, "document already exists");
        ItemOutcome::AlreadyKnown(doc_id.clone())
    };

    // Always record the observation, new or re-ingest.
    catalog
        .insert_version(&DocVersion {
            doc_id,
            run_id: run_id.to_string(),
            source_id: item.source_id.clone(),
            ingest_at: now.timestamp(),
            etag: item.etag.clone(),
        })
        .await
        .map_err(|e| PipelineError::CatalogWriteFailed(e.to_string()))?;

    Ok(outcome)
}
