//! Command composition: wiring config, catalog, blob store, and
//! connector together for the `scan`, `run`, and `watch` commands.
//!
//! One external trigger (a CLI invocation or a watch tick) drives one
//! detector evaluation, which hands at most one work order to one
//! orchestrator run — there is never more than one active run per
//! pipeline here.

use anyhow::{bail, Result};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::blob::{self, BlobStore};
use crate::catalog::sqlite::SqliteCatalog;
use crate::config::Config;
use crate::connector::{Connector, ConnectorRegistry};
use crate::db;
use crate::detect::{ChangeDetector, Evaluation, Strategy};
use crate::ingest::run_ingest;

struct Pipeline {
    catalog: SqliteCatalog,
    blobs: Box<dyn BlobStore>,
    registry: ConnectorRegistry,
    strategy: Strategy,
}

impl Pipeline {
    async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let strategy = Strategy::parse(&config.detector.strategy)
            .ok_or_else(|| anyhow::anyhow!("invalid detector strategy in config"))?;

        Ok(Self {
            catalog: SqliteCatalog::new(pool),
            blobs: blob::from_config(&config.blobs)?,
            registry: ConnectorRegistry::from_config(config)?,
            strategy,
        })
    }

    fn connector(&self, name: &str) -> Result<&dyn Connector> {
        match self.registry.find(name) {
            Some(c) => Ok(c),
            None => {
                let available: Vec<&str> = self
                    .registry
                    .connectors()
                    .iter()
                    .map(|c| c.name())
                    .collect();
                bail!(
                    "Unknown connector: '{}'. Configured: {}",
                    name,
                    if available.is_empty() {
                        "(none)".to_string()
                    } else {
                        available.join(", ")
                    }
                )
            }
        }
    }
}

/// Evaluate only; print the work order without ingesting anything.
pub async fn run_scan(config: &Config, connector_name: &str) -> Result<()> {
    let pipeline = Pipeline::open(config).await?;
    let connector = pipeline.connector(connector_name)?;

    let detector = ChangeDetector::new(connector, &pipeline.catalog, pipeline.strategy);
    match detector.evaluate().await {
        Evaluation::NoWork { reason } => {
            println!("scan {}", connector_name);
            println!("  no new work ({})", reason);
        }
        Evaluation::WorkOrder(ids) => {
            println!("scan {}", connector_name);
            println!("  items needing ingestion: {}", ids.len());
            for id in &ids {
                println!("    {}", id);
            }
        }
    }
    println!("ok");
    Ok(())
}

/// One evaluate-then-ingest cycle.
pub async fn run_once(config: &Config, connector_name: &str) -> Result<()> {
    let pipeline = Pipeline::open(config).await?;
    execute_cycle(&pipeline, connector_name).await
}

/// Poll loop: one evaluation per tick, runs strictly sequential.
///
/// Configuration problems (bad connector name) fail fast before the
/// loop starts; a failed cycle inside the loop is logged and retried on
/// the next tick.
pub async fn run_watch(config: &Config, connector_name: &str, interval: Option<u64>) -> Result<()> {
    let pipeline = Pipeline::open(config).await?;
    pipeline.connector(connector_name)?;
    let interval_secs = interval.unwrap_or(config.detector.poll_interval_secs);

    info!(
        connector = connector_name,
        interval_secs, "watching for new files"
    );
    loop {
        watch_cycle(&pipeline, connector_name).await;
        sleep(Duration::from_secs(interval_secs)).await;
    }
}

/// One watch tick. A run-level failure (locked catalog, unreachable
/// blob store) never unwinds the loop: any item it did not commit stays
/// unconfirmed and is re-emitted next tick.
async fn watch_cycle(pipeline: &Pipeline, connector_name: &str) {
    if let Err(e) = execute_cycle(pipeline, connector_name).await {
        error!(
            connector = connector_name,
            error = %e,
            "cycle failed, retrying next tick"
        );
    }
}

async fn execute_cycle(pipeline: &Pipeline, connector_name: &str) -> Result<()> {
    let connector = pipeline.connector(connector_name)?;
    let detector = ChangeDetector::new(connector, &pipeline.catalog, pipeline.strategy);

    match detector.evaluate().await {
        Evaluation::NoWork { reason } => {
            info!(connector = connector_name, reason = %reason, "no new work");
            println!("ingest {}", connector_name);
            println!("  no new work ({})", reason);
            println!("ok");
        }
        Evaluation::WorkOrder(ids) => {
            let stats =
                run_ingest(connector, &pipeline.catalog, pipeline.blobs.as_ref(), &ids).await?;
            println!("ingest {}", connector_name);
            println!("  discovered: {}", stats.discovered);
            println!("  ingested:   {}", stats.ingested);
            println!("  skipped:    {}", stats.skipped);
            println!("  errors:     {}", stats.errors);
            println!("ok");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlobsConfig, Config, ConnectorsConfig, DbConfig, FileDropConfig};
    use crate::migrate;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    fn test_config(root: &Path) -> Config {
        let mut file_drop = HashMap::new();
        file_drop.insert(
            "inbox".to_string(),
            FileDropConfig {
                root: root.join("inbox"),
                source_name: "file_drop".to_string(),
                recursive: false,
                extensions: vec![],
            },
        );
        Config {
            db: DbConfig {
                path: root.join("data/catalog.sqlite"),
            },
            blobs: BlobsConfig {
                backend: "fs".to_string(),
                root: Some(root.join("data/blobs")),
                bucket: None,
                region: "us-east-1".to_string(),
                endpoint_url: None,
            },
            detector: Default::default(),
            connectors: ConnectorsConfig { file_drop },
        }
    }

    #[tokio::test]
    async fn failed_cycle_does_not_unwind_the_watch_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        migrate::run_migrations(&cfg).await.unwrap();

        fs::create_dir_all(tmp.path().join("inbox")).unwrap();
        fs::write(tmp.path().join("inbox/a.txt"), "alpha").unwrap();

        let pipeline = Pipeline::open(&cfg).await.unwrap();

        // Break the lineage table: the detector still emits a work order
        // but the run fails at its lineage write.
        let pool = crate::db::connect(&cfg).await.unwrap();
        sqlx::query("DROP TABLE events_lineage")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        assert!(execute_cycle(&pipeline, "inbox").await.is_err());

        // The same failure inside a watch tick is absorbed.
        watch_cycle(&pipeline, "inbox").await;
    }

    #[tokio::test]
    async fn watch_rejects_unknown_connector_up_front() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        migrate::run_migrations(&cfg).await.unwrap();

        let pipeline = Pipeline::open(&cfg).await.unwrap();
        assert!(pipeline.connector("nonexistent").is_err());
    }
}
