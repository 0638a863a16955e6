//! API metadata loading
//!
//! Reads every `*.json` file below `api-docs/api` into an [`ApiDocument`] and every
//! file below `api-docs/indices` into an [`ApiIndex`]. Files are parsed on the blocking
//! pool, each stamped with its modification time. Documents lose their hidden
//! table-of-contents items on load; nothing else mutates them afterwards.

use crate::config::BuilderSettings;
use crate::core::DocError;
use crate::models::{ApiDocument, ApiIndex};
use crate::utils::map_blocking;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A metadata file type that can be loaded from a source directory.
pub trait MetadataFile: DeserializeOwned + Send + 'static {
    /// Name used in log and error messages.
    const DISPLAY_NAME: &'static str;

    /// Record the source file's modification time and normalize after parsing.
    fn loaded(&mut self, modified: DateTime<Utc>);
}

impl MetadataFile for ApiDocument {
    const DISPLAY_NAME: &'static str = "documents";

    fn loaded(&mut self, modified: DateTime<Utc>) {
        self.source_modified = modified;
        let removed = self.drop_hidden_items();
        if removed > 0 {
            tracing::debug!("Dropped {removed} hidden items from {}", self.entity.uri.href);
        }
    }
}

impl MetadataFile for ApiIndex {
    const DISPLAY_NAME: &'static str = "indices";

    fn loaded(&mut self, modified: DateTime<Utc>) {
        self.source_modified = modified;
    }
}

/// Load all API documents of `settings.root`.
///
/// # Errors
///
/// See [`load_dir`].
pub async fn load_documents(settings: &BuilderSettings) -> Result<Vec<ApiDocument>> {
    load_dir(settings.api_dir()).await
}

/// Load all descendant indices of `settings.root`.
///
/// # Errors
///
/// See [`load_dir`].
pub async fn load_indices(settings: &BuilderSettings) -> Result<Vec<ApiIndex>> {
    load_dir(settings.indices_dir()).await
}

/// Parse every `*.json` file below `dir`, sorted by path.
///
/// # Errors
///
/// - [`DocError::SourceFileNotFound`] if `dir` does not exist
/// - [`DocError::MetadataParse`] for the first file that is not valid metadata
pub async fn load_dir<T: MetadataFile>(dir: PathBuf) -> Result<Vec<T>> {
    if !dir.is_dir() {
        return Err(DocError::SourceFileNotFound {
            what: format!("API {} directory", T::DISPLAY_NAME),
            path: dir.display().to_string(),
        }
        .into());
    }

    let started = Instant::now();
    tracing::debug!("Reading API {} from '{}'", T::DISPLAY_NAME, dir.display());
    let files = list_json_files(&dir)?;
    tracing::debug!("{} API {} source files identified", files.len(), T::DISPLAY_NAME);

    let parsed = map_blocking(files, Arc::new(|path: PathBuf| parse_file::<T>(&path))).await?;
    tracing::debug!(
        "{} API {} source files parsed in {:?}",
        parsed.len(),
        T::DISPLAY_NAME,
        started.elapsed()
    );
    Ok(parsed)
}

/// Parse one metadata file.
///
/// # Errors
///
/// Returns [`DocError::MetadataParse`] if the file is not valid JSON for `T`, or an I/O
/// error if it cannot be read.
pub fn parse_file<T: MetadataFile>(path: &Path) -> Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut value: T = serde_json::from_str(&text).map_err(|e| {
        tracing::error!("Failed to parse '{}'", path.display());
        DocError::MetadataParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    value.loaded(DateTime::<Utc>::from(modified));
    Ok(value)
}

fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NODE: &str = r#"{
        "entity": {
            "id": { "id": "Fuse.Node", "parentId": "Fuse", "type": "Class" },
            "uri": { "href": "fuse/node", "idUri": "fuse/node" },
            "titles": { "pageTitle": "Node Class", "indexTitle": "Node", "fullyQualifiedIndexTitle": "Fuse.Node" }
        },
        "tableOfContents": {
            "methods": [{
                "items": [
                    {
                        "id": { "id": "Fuse.Node.Show", "parentId": "Fuse.Node", "type": "Method" },
                        "uri": { "href": "fuse/node/show" },
                        "titles": { "indexTitle": "Show()" }
                    },
                    {
                        "id": { "id": "Fuse.Node.Secret", "parentId": "Fuse.Node", "type": "Method" },
                        "uri": { "href": "fuse/node/secret" },
                        "titles": { "indexTitle": "Secret()" },
                        "comment": { "attributes": { "hidden": true } }
                    }
                ]
            }]
        }
    }"#;

    fn write(root: &Path, path: &str, text: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[tokio::test]
    async fn test_load_documents_drops_hidden_items() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "fuse/node.json", NODE);
        write(temp.path(), "fuse/notes.txt", "ignored");

        let documents: Vec<ApiDocument> = load_dir(temp.path().to_path_buf()).await.unwrap();
        assert_eq!(documents.len(), 1);

        let document = &documents[0];
        assert_eq!(document.entity.uri.href, "fuse/node");
        let items = &document.table_of_contents["methods"][0].items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].titles.index_title, "Show()");
        assert!(document.source_modified.timestamp() > 0);
    }

    #[tokio::test]
    async fn test_load_indices() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "fuse/node.json",
            r#"{ "root": { "uri": { "href": "fuse/node" } }, "descendants": [ { "uri": { "href": "fuse/visual" } } ] }"#,
        );

        let indices: Vec<ApiIndex> = load_dir(temp.path().to_path_buf()).await.unwrap();
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].root.uri.href, "fuse/node");
        assert_eq!(indices[0].descendants.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "broken.json", "{ not json");

        let err = load_dir::<ApiDocument>(temp.path().to_path_buf()).await.unwrap_err();
        match err.downcast_ref::<DocError>() {
            Some(DocError::MetadataParse { path, .. }) => assert!(path.ends_with("broken.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = load_dir::<ApiIndex>(temp.path().join("indices")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::SourceFileNotFound { .. })));
    }
}
