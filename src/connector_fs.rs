//! File-drop connector.
//!
//! Watches a directory for dropped files. External ids are paths
//! relative to the watch root; `source_id` is
//! `"<source_name>::<external_id>"`. A missing watch root is created on
//! construction, not treated as an error, so a freshly provisioned
//! deployment starts from an empty directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::FileDropConfig;
use crate::connector::Connector;
use crate::error::PipelineError;
use crate::models::FetchedItem;

pub struct FileDropConnector {
    name: String,
    config: FileDropConfig,
}

impl FileDropConnector {
    /// Create a connector instance, auto-creating the watch root.
    pub fn new(name: String, config: FileDropConfig) -> anyhow::Result<Self> {
        if !config.root.exists() {
            std::fs::create_dir_all(&config.root)?;
            info!(directory = %config.root.display(), "watch directory created");
        }
        Ok(Self { name, config })
    }

    fn path_for(&self, external_id: &str) -> PathBuf {
        self.config.root.join(external_id)
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.config.extensions.is_empty() {
            return true;
        }
        let suffix = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        self.config.extensions.iter().any(|allowed| *allowed == suffix)
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[async_trait]
impl Connector for FileDropConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Watch a local directory for dropped files"
    }

    fn source(&self) -> &str {
        &self.config.source_name
    }

    async fn discover(&self) -> Result<Vec<String>, PipelineError> {
        let root = &self.config.root;
        if !root.exists() {
            std::fs::create_dir_all(root).map_err(|e| {
                PipelineError::SourceUnavailable(format!(
                    "cannot create watch root {}: {}",
                    root.display(),
                    e
                ))
            })?;
            return Ok(Vec::new());
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(root)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        let mut ids = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Errors at the root abort discovery; a single bad
                    // entry deeper down is skipped.
                    if e.depth() == 0 {
                        return Err(PipelineError::SourceUnavailable(format!(
                            "cannot read watch root {}: {}",
                            root.display(),
                            e
                        )));
                    }
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if !self.extension_allowed(entry.path()) {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            ids.push(relative.to_string_lossy().to_string());
        }

        ids.sort();
        Ok(ids)
    }

    async fn fetch(&self, external_id: &str) -> Result<FetchedItem, PipelineError> {
        let path = self.path_for(external_id);
        if !path.exists() {
            return Err(PipelineError::NotFound(external_id.to_string()));
        }

        let content = std::fs::read(&path).map_err(|e| PipelineError::FetchFailed {
            id: external_id.to_string(),
            reason: e.to_string(),
        })?;

        let metadata = std::fs::metadata(&path).map_err(|e| PipelineError::FetchFailed {
            id: external_id.to_string(),
            reason: e.to_string(),
        })?;
        let modified: DateTime<Utc> = metadata
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .into();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let absolute = path.canonicalize().unwrap_or_else(|_| path.clone());

        Ok(FetchedItem {
            size_bytes: content.len() as i64,
            source_id: format!("{}::{}", self.config.source_name, external_id),
            mime_type: detect_content_type(&path),
            url: Some(format!("file://{}", absolute.display())),
            etag: None,
            license: None,
            fetched_at: Utc::now(),
            metadata: serde_json::json!({
                "file_name": file_name,
                "file_extension": file_extension,
                "modified_at": modified.to_rfc3339(),
                "absolute_path": absolute.display().to_string(),
            }),
            content,
        })
    }

    async fn fingerprint(&self, external_id: &str) -> Result<String, PipelineError> {
        let path = self.path_for(external_id);
        if !path.exists() {
            return Err(PipelineError::NotFound(external_id.to_string()));
        }

        let metadata = std::fs::metadata(&path).map_err(|e| PipelineError::FetchFailed {
            id: external_id.to_string(),
            reason: e.to_string(),
        })?;
        let mtime_ms = metadata
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        // mtime + size; cheap but weaker than content hashing
        Ok(format!("{}:{}", mtime_ms, metadata.len()))
    }
}

/// Detect MIME content type from a file extension.
fn detect_content_type(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("md") => "text/markdown".to_string(),
        Some("txt") => "text/plain".to_string(),
        Some("json") => "application/json".to_string(),
        Some("yaml" | "yml") => "text/yaml".to_string(),
        Some("csv") => "text/csv".to_string(),
        Some("html" | "htm") => "text/html".to_string(),
        Some("pdf") => "application/pdf".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn connector(root: &Path, extensions: Vec<String>, recursive: bool) -> FileDropConnector {
        FileDropConnector::new(
            "inbox".to_string(),
            FileDropConfig {
                root: root.to_path_buf(),
                source_name: "file_drop".to_string(),
                recursive,
                extensions,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn discover_skips_hidden_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::write(tmp.path().join(".hidden"), "h").unwrap();
        fs::create_dir(tmp.path().join("subdir")).unwrap();

        let c = connector(tmp.path(), vec![], false);
        assert_eq!(c.discover().await.unwrap(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn discover_filters_by_extension_allow_list() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("keep.md"), "x").unwrap();
        fs::write(tmp.path().join("drop.bin"), "x").unwrap();

        let c = connector(tmp.path(), vec![".md".to_string()], false);
        assert_eq!(c.discover().await.unwrap(), vec!["keep.md"]);
    }

    #[tokio::test]
    async fn discover_recursive_walks_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/deep.txt"), "x").unwrap();
        fs::write(tmp.path().join("top.txt"), "x").unwrap();

        let flat = connector(tmp.path(), vec![], false);
        assert_eq!(flat.discover().await.unwrap(), vec!["top.txt"]);

        let deep = connector(tmp.path(), vec![], true);
        assert_eq!(
            deep.discover().await.unwrap(),
            vec!["nested/deep.txt", "top.txt"]
        );
    }

    #[tokio::test]
    async fn missing_root_is_created_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("not_yet_here");

        let c = connector(&root, vec![], false);
        assert!(root.exists());
        assert!(c.discover().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_builds_source_id_and_mime() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("note.md"), "# hi").unwrap();

        let c = connector(tmp.path(), vec![], false);
        let item = c.fetch("note.md").await.unwrap();
        assert_eq!(item.source_id, "file_drop::note.md");
        assert_eq!(item.mime_type, "text/markdown");
        assert_eq!(item.size_bytes, 4);
        assert_eq!(item.content, b"# hi");
    }

    #[tokio::test]
    async fn fetch_vanished_item_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let c = connector(tmp.path(), vec![], false);
        match c.fetch("gone.txt").await {
            Err(PipelineError::NotFound(id)) => assert_eq!(id, "gone.txt"),
            other => panic!("expected NotFound, got {:?}", other.map(|i| i.source_id)),
        }
    }

    #[tokio::test]
    async fn fingerprint_tracks_size() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("f.txt"), "one").unwrap();

        let c = connector(tmp.path(), vec![], false);
        let fp1 = c.fingerprint("f.txt").await.unwrap();
        fs::write(tmp.path().join("f.txt"), "longer content").unwrap();
        let fp2 = c.fingerprint("f.txt").await.unwrap();
        assert_ne!(fp1, fp2);
    }
}
