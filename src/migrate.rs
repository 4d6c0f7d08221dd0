use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Catalog of unique content, keyed by content hash
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS docs (
            doc_id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            mime TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            ingest_first_at INTEGER NOT NULL,
            ingest_last_at INTEGER NOT NULL,
            url TEXT,
            license TEXT,
            hash_alg TEXT NOT NULL DEFAULT 'sha256',
            dq_status TEXT NOT NULL DEFAULT 'pending'
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Append-only observation history. Deliberately no uniqueness
    // constraint: two observations of identical content from different
    // paths within one run are two rows.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doc_versions (
            doc_id TEXT NOT NULL,
            run_id TEXT NOT NULL,
            source_id TEXT NOT NULL,
            ingest_at INTEGER NOT NULL,
            etag TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Run bookkeeping. A hash only counts as confirmed once its run has
    // completed_at set.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            run_id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            completed_at INTEGER
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Lineage audit trail; id lists stored as JSON arrays
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events_lineage (
            event_id TEXT PRIMARY KEY,
            run_id TEXT NOT NULL,
            task_name TEXT NOT NULL,
            input_ids TEXT NOT NULL,
            output_ids TEXT NOT NULL,
            event_time INTEGER NOT NULL,
            duration_ms INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Timestamp-strategy cursor state, one row per source
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cursors (
            source TEXT PRIMARY KEY,
            state TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doc_versions_doc_id ON doc_versions(doc_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doc_versions_run_id ON doc_versions(run_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_docs_source_id ON docs(source_id)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
