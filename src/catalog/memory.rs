//! In-memory [`CatalogStore`] implementation for tests.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread
//! safety. Mirrors the SQLite backend's semantics exactly, including
//! insert-if-absent and the completed-run join for confirmed hashes.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogStats, DocVersion, Document, LineageEvent};

use super::CatalogStore;

struct RunRecord {
    source: String,
    completed_at: Option<i64>,
}

/// In-memory catalog for testing.
#[derive(Default)]
pub struct MemoryCatalog {
    docs: RwLock<HashMap<String, Document>>,
    versions: RwLock<Vec<DocVersion>>,
    runs: RwLock<HashMap<String, RunRecord>>,
    lineage: RwLock<Vec<LineageEvent>>,
    cursors: RwLock<HashMap<String, String>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observation records accumulated so far (test inspection).
    pub fn versions(&self) -> Vec<DocVersion> {
        self.versions.read().unwrap().clone()
    }

    /// Lineage events recorded so far (test inspection).
    pub fn lineage_events(&self) -> Vec<LineageEvent> {
        self.lineage.read().unwrap().clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_document(&self, doc_id: &str) -> Result<Option<Document>> {
        Ok(self.docs.read().unwrap().get(doc_id).cloned())
    }

    async fn insert_document(&self, doc: &Document) -> Result<bool> {
        let mut docs = self.docs.write().unwrap();
        if docs.contains_key(&doc.doc_id) {
            return Ok(false);
        }
        docs.insert(doc.doc_id.clone(), doc.clone());
        Ok(true)
    }

    async fn touch_last_seen(&self, doc_id: &str, at: i64) -> Result<()> {
        if let Some(doc) = self.docs.write().unwrap().get_mut(doc_id) {
            doc.ingest_last_at = at;
        }
        Ok(())
    }

    async fn insert_version(&self, version: &DocVersion) -> Result<()> {
        self.versions.write().unwrap().push(version.clone());
        Ok(())
    }

    async fn confirmed_hashes(&self, source: Option<&str>) -> Result<HashSet<String>> {
        let runs = self.runs.read().unwrap();
        let confirmed = self
            .versions
            .read()
            .unwrap()
            .iter()
            .filter(|v| {
                runs.get(&v.run_id).map_or(false, |r| {
                    r.completed_at.is_some() && source.map_or(true, |s| r.source == s)
                })
            })
            .map(|v| v.doc_id.clone())
            .collect();
        Ok(confirmed)
    }

    async fn begin_run(&self, run_id: &str, source: &str, _at: i64) -> Result<()> {
        self.runs.write().unwrap().insert(
            run_id.to_string(),
            RunRecord {
                source: source.to_string(),
                completed_at: None,
            },
        );
        Ok(())
    }

    async fn complete_run(&self, run_id: &str, at: i64) -> Result<()> {
        if let Some(run) = self.runs.write().unwrap().get_mut(run_id) {
            run.completed_at = Some(at);
        }
        Ok(())
    }

    async fn record_lineage(&self, event: &LineageEvent) -> Result<()> {
        self.lineage.write().unwrap().push(event.clone());
        Ok(())
    }

    async fn load_cursor(&self, source: &str) -> Result<Option<String>> {
        Ok(self.cursors.read().unwrap().get(source).cloned())
    }

    async fn store_cursor(&self, source: &str, state: &str, _at: i64) -> Result<()> {
        self.cursors
            .write()
            .unwrap()
            .insert(source.to_string(), state.to_string());
        Ok(())
    }

    async fn stats(&self) -> Result<CatalogStats> {
        let runs = self.runs.read().unwrap();
        Ok(CatalogStats {
            documents: self.docs.read().unwrap().len() as i64,
            versions: self.versions.read().unwrap().len() as i64,
            runs_total: runs.len() as i64,
            runs_completed: runs.values().filter(|r| r.completed_at.is_some()).count() as i64,
            lineage_events: self.lineage.read().unwrap().len() as i64,
        })
    }
}
