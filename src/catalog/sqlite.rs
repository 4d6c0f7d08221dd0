//! SQLite-backed [`CatalogStore`] implementation.
//!
//! All statements are parameterized sqlx queries against the pool from
//! [`crate::db::connect`]. Schema is created by [`crate::migrate`].

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::models::{CatalogStats, DocVersion, Document, LineageEvent};

use super::CatalogStore;

/// Catalog accessor over a shared SQLite pool.
///
/// Explicitly constructed and passed into the detector/orchestrator;
/// lifecycle (open/close) is owned by the caller.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        doc_id: row.get("doc_id"),
        source_id: row.get("source_id"),
        mime: row.get("mime"),
        size_bytes: row.get("size_bytes"),
        ingest_first_at: row.get("ingest_first_at"),
        ingest_last_at: row.get("ingest_last_at"),
        url: row.get("url"),
        license: row.get("license"),
        hash_alg: row.get("hash_alg"),
        dq_status: row.get("dq_status"),
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn find_document(&self, doc_id: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT * FROM docs WHERE doc_id = ?")
            .bind(doc_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn insert_document(&self, doc: &Document) -> Result<bool> {
        // ON CONFLICT DO NOTHING makes concurrent duplicate ingestion a
        // race with exactly one winner; the loser sees rows_affected 0.
        let result = sqlx::query(
            r#"
            INSERT INTO docs
                (doc_id, source_id, mime, size_bytes, ingest_first_at, ingest_last_at,
                 url, license, hash_alg, dq_status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(doc_id) DO NOTHING
            "#,
        )
        .bind(&doc.doc_id)
        .bind(&doc.source_id)
        .bind(&doc.mime)
        .bind(doc.size_bytes)
        .bind(doc.ingest_first_at)
        .bind(doc.ingest_last_at)
        .bind(&doc.url)
        .bind(&doc.license)
        .bind(&doc.hash_alg)
        .bind(&doc.dq_status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_seen(&self, doc_id: &str, at: i64) -> Result<()> {
        sqlx::query("UPDATE docs SET ingest_last_at = ? WHERE doc_id = ?")
            .bind(at)
            .bind(doc_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_version(&self, version: &DocVersion) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO doc_versions (doc_id, run_id, source_id, ingest_at, etag)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&version.doc_id)
        .bind(&version.run_id)
        .bind(&version.source_id)
        .bind(version.ingest_at)
        .bind(&version.etag)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn confirmed_hashes(&self, source: Option<&str>) -> Result<HashSet<String>> {
        let rows = match source {
            Some(source) => {
                sqlx::query(
                    r#"
                    SELECT DISTINCT dv.doc_id
                    FROM doc_versions dv
                    JOIN runs r ON r.run_id = dv.run_id
                    WHERE r.completed_at IS NOT NULL AND r.source = ?
                    "#,
                )
                .bind(source)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT DISTINCT dv.doc_id
                    FROM doc_versions dv
                    JOIN runs r ON r.run_id = dv.run_id
                    WHERE r.completed_at IS NOT NULL
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(|row| row.get("doc_id")).collect())
    }

    async fn begin_run(&self, run_id: &str, source: &str, at: i64) -> Result<()> {
        sqlx::query("INSERT INTO runs (run_id, source, started_at) VALUES (?, ?, ?)")
            .bind(run_id)
            .bind(source)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete_run(&self, run_id: &str, at: i64) -> Result<()> {
        sqlx::query("UPDATE runs SET completed_at = ? WHERE run_id = ?")
            .bind(at)
            .bind(run_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_lineage(&self, event: &LineageEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events_lineage
                (event_id, run_id, task_name, input_ids, output_ids, event_time, duration_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.event_id)
        .bind(&event.run_id)
        .bind(&event.task_name)
        .bind(serde_json::to_string(&event.input_ids)?)
        .bind(serde_json::to_string(&event.output_ids)?)
        .bind(event.event_time)
        .bind(event.duration_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_cursor(&self, source: &str) -> Result<Option<String>> {
        let state: Option<String> = sqlx::query_scalar("SELECT state FROM cursors WHERE source = ?")
            .bind(source)
            .fetch_optional(&self.pool)
            .await?;
        Ok(state)
    }

    async fn store_cursor(&self, source: &str, state: &str, at: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cursors (source, state, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(source) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at
            "#,
        )
        .bind(source)
        .bind(state)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<CatalogStats> {
        let documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM docs")
            .fetch_one(&self.pool)
            .await?;
        let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doc_versions")
            .fetch_one(&self.pool)
            .await?;
        let runs_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs")
            .fetch_one(&self.pool)
            .await?;
        let runs_completed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM runs WHERE completed_at IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        let lineage_events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events_lineage")
            .fetch_one(&self.pool)
            .await?;

        Ok(CatalogStats {
            documents,
            versions,
            runs_total,
            runs_completed,
            lineage_events,
        })
    }
}
