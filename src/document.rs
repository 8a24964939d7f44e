//! Tournament data document persistence.
//!
//! The document is written byte-identically to two locations: the tracked
//! copy inside the git working tree and the served copy under the web root.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::Config;

/// Tournament state as received from the admin page.
pub type Document = Map<String, Value>;

/// Serialize a document with two-space indentation and one trailing newline.
pub fn render(document: &Document) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Extract `meta.lastUpdated` from a document, if it is a string.
pub fn last_updated(document: &Value) -> Option<&str> {
    document.get("meta")?.get("lastUpdated")?.as_str()
}

/// Reads and writes the two persisted copies.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    repo_path: PathBuf,
    web_path: PathBuf,
}

impl DocumentStore {
    /// Create a store for explicit paths.
    pub fn new(repo_path: impl Into<PathBuf>, web_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            web_path: web_path.into(),
        }
    }

    /// Create a store from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.repo_data_path(), config.web_data_path())
    }

    /// Path of the tracked copy.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Path of the served copy.
    pub fn web_path(&self) -> &Path {
        &self.web_path
    }

    /// Read `meta.lastUpdated` from the tracked copy.
    ///
    /// Returns `None` when the file is missing, unreadable, not JSON, or has
    /// no marker; callers treat that as "skip the lock check".
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub async fn current_last_updated(&self) -> Option<String> {
        let bytes = match tokio::fs::read(&self.repo_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not read current document: {}", e);
                return None;
            }
        };

        let current: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!("Current document is not valid JSON: {}", e);
                return None;
            }
        };

        let marker = last_updated(&current).map(str::to_owned);
        if marker.is_none() {
            debug!("Current document has no meta.lastUpdated");
        }
        marker
    }

    /// Replace both copies with the rendered document.
    #[instrument(skip(self, document))]
    pub async fn write(&self, document: &Document) -> std::io::Result<()> {
        let bytes = render(document).map_err(std::io::Error::other)?;

        for path in [&self.repo_path, &self.web_path] {
            tokio::fs::write(path, &bytes).await?;
            debug!(path = %path.display(), bytes = bytes.len(), "Wrote document");
        }

        Ok(())
    }
}
