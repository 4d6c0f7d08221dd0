//! Catalog statistics overview.
//!
//! Provides a quick summary of what's been ingested: document, version,
//! run, and lineage counts. Used by `lakedrop stats` to give confidence
//! that evaluations and runs are doing what they should.

use anyhow::Result;

use crate::catalog::sqlite::SqliteCatalog;
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let catalog = SqliteCatalog::new(pool);

    let stats = catalog.stats().await?;
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("lakedrop — Catalog Stats");
    println!("========================");
    println!();
    println!("  Database:        {}", config.db.path.display());
    println!("  Size:            {}", format_bytes(db_size));
    println!();
    println!("  Documents:       {}", stats.documents);
    println!("  Versions:        {}", stats.versions);
    println!(
        "  Runs:            {} ({} completed)",
        stats.runs_total, stats.runs_completed
    );
    println!("  Lineage events:  {}", stats.lineage_events);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
