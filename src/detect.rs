//! Change detection.
//!
//! Decides which source items are "new work". Two strategies share the
//! same contract:
//!
//! - **Hash-confirmed** (default): a file needs ingestion unless its
//!   content hash already appears in a version record tied to a
//!   completed run. Stateless — truth is re-derived from the catalog on
//!   every evaluation, so it cannot drift from what was durably
//!   recorded.
//! - **Timestamp**: compares per-file fingerprints (mtime + size)
//!   against a persisted cursor. Cheaper, but mis-detects "changed"
//!   when an mtime is touched without a content change.
//!
//! An evaluation never raises past this boundary: enumeration failures
//! reduce to [`Evaluation::NoWork`] with a diagnostic, and unreadable
//! individual files are excluded from the current-state set (neither
//! confirmed seen nor emitted).

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::catalog::CatalogStore;
use crate::connector::Connector;
use crate::error::PipelineError;
use crate::identity::compute_doc_id;

/// Outcome of one detector evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Nothing to do. The reason is diagnostic only.
    NoWork { reason: String },
    /// External ids that need (re)processing, deterministically ordered.
    WorkOrder(Vec<String>),
}

/// Change-detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Timestamp,
    HashConfirmed,
}

impl Strategy {
    /// Parse the config string (`"timestamp"` / `"hash-confirmed"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "timestamp" => Some(Self::Timestamp),
            "hash-confirmed" => Some(Self::HashConfirmed),
            _ => None,
        }
    }
}

/// Evaluates the current source state against prior-seen state.
///
/// Reads from the catalog (confirmed hashes, cursor state) but writes
/// only its own cursor record; all other catalog mutation belongs to
/// the orchestrator.
pub struct ChangeDetector<'a> {
    connector: &'a dyn Connector,
    catalog: &'a dyn CatalogStore,
    strategy: Strategy,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(
        connector: &'a dyn Connector,
        catalog: &'a dyn CatalogStore,
        strategy: Strategy,
    ) -> Self {
        Self {
            connector,
            catalog,
            strategy,
        }
    }

    /// Run one evaluation: `Idle → Scanning → {NoWork | WorkOrder}`.
    pub async fn evaluate(&self) -> Evaluation {
        let ids = match self.connector.discover().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "discovery failed");
                return Evaluation::NoWork {
                    reason: format!("discovery failed: {}", e),
                };
            }
        };

        if ids.is_empty() {
            return Evaluation::NoWork {
                reason: "watch directory is empty".to_string(),
            };
        }

        match self.strategy {
            Strategy::Timestamp => self.evaluate_timestamp(&ids).await,
            Strategy::HashConfirmed => self.evaluate_hash_confirmed(&ids).await,
        }
    }

    async fn evaluate_timestamp(&self, ids: &[String]) -> Evaluation {
        // BTreeMap keeps the work order sorted by file name.
        let mut current: BTreeMap<String, String> = BTreeMap::new();
        for id in ids {
            match self.connector.fingerprint(id).await {
                Ok(fp) => {
                    current.insert(id.clone(), fp);
                }
                Err(e) => {
                    warn!(external_id = %id, error = %e, "fingerprint failed, excluding file");
                }
            }
        }

        let source = self.connector.source();
        let previous = match self.catalog.load_cursor(source).await {
            Ok(state) => parse_cursor(state.as_deref()),
            Err(e) => {
                error!(error = %e, "cursor load failed");
                return Evaluation::NoWork {
                    reason: format!("cursor load failed: {}", e),
                };
            }
        };

        let changed: Vec<String> = current
            .iter()
            .filter(|(id, fp)| previous.get(id.as_str()) != Some(*fp))
            .map(|(id, _)| id.clone())
            .collect();

        if changed.is_empty() {
            return Evaluation::NoWork {
                reason: format!("no new or modified files (tracking {})", current.len()),
            };
        }

        // Persist every current key, not just the changed ones, and only
        // once we know a work order is going out.
        match serde_json::to_string(&current) {
            Ok(state) => {
                if let Err(e) = self
                    .catalog
                    .store_cursor(source, &state, Utc::now().timestamp())
                    .await
                {
                    // The work order still stands; the orchestrator's
                    // content-hash dedup absorbs the re-detection.
                    error!(error = %e, "cursor store failed");
                }
            }
            Err(e) => error!(error = %e, "cursor serialization failed"),
        }

        Evaluation::WorkOrder(changed)
    }

    async fn evaluate_hash_confirmed(&self, ids: &[String]) -> Evaluation {
        let confirmed = match self.catalog.confirmed_hashes(None).await {
            Ok(set) => set,
            Err(e) => {
                error!(error = %e, "confirmed-hash query failed");
                return Evaluation::NoWork {
                    reason: format!("confirmed-hash query failed: {}", e),
                };
            }
        };

        let mut pending: Vec<(String, String)> = Vec::new();
        let mut tracked = 0usize;
        for id in ids {
            let item = match self.connector.fetch(id).await {
                Ok(item) => item,
                Err(e) => {
                    let e = match e {
                        PipelineError::FetchFailed { id, reason } => {
                            PipelineError::IdentityComputationFailed { id, reason }
                        }
                        other => other,
                    };
                    warn!(external_id = %id, error = %e, "hashing failed, excluding file");
                    continue;
                }
            };
            tracked += 1;

            let doc_id = compute_doc_id(&item.content);
            if confirmed.contains(&doc_id) {
                debug!(external_id = %id, doc_id = %doc_id, "content already confirmed");
            } else {
                pending.push((doc_id, id.clone()));
            }
        }

        if pending.is_empty() {
            return Evaluation::NoWork {
                reason: format!("no unconfirmed content (tracking {})", tracked),
            };
        }

        // Lexicographic by content hash, external id as tie-break.
        pending.sort();
        Evaluation::WorkOrder(pending.into_iter().map(|(_, id)| id).collect())
    }
}

/// Parse persisted cursor state as a typed mapping.
///
/// Corrupt state fails closed: it is treated as empty, so every current
/// file is considered new. Cursor text is data, never evaluated.
fn parse_cursor(state: Option<&str>) -> HashMap<String, String> {
    match state {
        None => HashMap::new(),
        Some(raw) => match serde_json::from_str(raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    error = %PipelineError::CursorCorrupt(e.to_string()),
                    "treating cursor as empty"
                );
                HashMap::new()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_known_names_only() {
        assert_eq!(Strategy::parse("timestamp"), Some(Strategy::Timestamp));
        assert_eq!(
            Strategy::parse("hash-confirmed"),
            Some(Strategy::HashConfirmed)
        );
        assert_eq!(Strategy::parse("mtime"), None);
    }

    #[test]
    fn corrupt_cursor_fails_closed() {
        assert!(parse_cursor(Some("{'not': json}")).is_empty());
        assert!(parse_cursor(Some("__import__('os')")).is_empty());
        assert!(parse_cursor(None).is_empty());
    }

    #[test]
    fn valid_cursor_roundtrips() {
        let parsed = parse_cursor(Some(r#"{"a.txt":"123:5","b.txt":"456:9"}"#));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a.txt"], "123:5");
    }
}
