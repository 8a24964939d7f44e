//! Mock version-control client for unit testing.
//!
//! Tracks the last committed content of each path so repeated saves of the
//! same bytes report [`CommitOutcome::NoOp`], like `git` would.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CommitOutcome, VersionControlClient};
use crate::error::VcsError;

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockVcsConfig {
    /// Fail every commit with this diagnostic.
    pub fail_commit: Option<String>,
    /// Fail every push with this diagnostic.
    pub fail_push: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    committed: HashMap<PathBuf, Vec<u8>>,
    commits: Vec<String>,
    pushes: Vec<String>,
}

/// Mock version-control client for testing.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    config: MockVcsConfig,
    state: Arc<Mutex<MockState>>,
}

impl MockVcs {
    /// Create a new mock client with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client with custom configuration.
    pub fn with_config(config: MockVcsConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    /// Messages of the commits made so far.
    pub fn commits(&self) -> Vec<String> {
        self.lock().commits.clone()
    }

    /// Refspecs pushed so far.
    pub fn pushes(&self) -> Vec<String> {
        self.lock().pushes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicked test thread must not hide later assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl VersionControlClient for MockVcs {
    async fn stage_and_commit(
        &self,
        path: &Path,
        message: &str,
    ) -> Result<CommitOutcome, VcsError> {
        let content = tokio::fs::read(path).await.map_err(|e| VcsError::CommandFailed {
            command: "add",
            output: e.to_string(),
        })?;

        let mut state = self.lock();
        if state.committed.get(path) == Some(&content) {
            return Ok(CommitOutcome::NoOp);
        }

        if let Some(output) = &self.config.fail_commit {
            return Err(VcsError::CommandFailed {
                command: "commit",
                output: output.clone(),
            });
        }

        state.committed.insert(path.to_path_buf(), content);
        state.commits.push(message.to_string());
        Ok(CommitOutcome::Committed)
    }

    async fn push(&self, refspec: &str) -> Result<(), VcsError> {
        if let Some(output) = &self.config.fail_push {
            return Err(VcsError::CommandFailed {
                command: "push",
                output: output.clone(),
            });
        }

        self.lock().pushes.push(refspec.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_content_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let vcs = MockVcs::new();

        std::fs::write(&path, b"{}\n").unwrap();
        assert_eq!(
            vcs.stage_and_commit(&path, "Update").await.unwrap(),
            CommitOutcome::Committed
        );
        assert_eq!(
            vcs.stage_and_commit(&path, "Update").await.unwrap(),
            CommitOutcome::NoOp
        );

        std::fs::write(&path, b"{\"a\": 1}\n").unwrap();
        assert_eq!(
            vcs.stage_and_commit(&path, "Update").await.unwrap(),
            CommitOutcome::Committed
        );
        assert_eq!(vcs.commits().len(), 2);
    }

    #[tokio::test]
    async fn configured_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{}\n").unwrap();

        let vcs = MockVcs::with_config(MockVcsConfig {
            fail_commit: Some("index.lock exists".into()),
            fail_push: Some("rejected".into()),
        });

        assert!(vcs.stage_and_commit(&path, "Update").await.is_err());
        assert!(vcs.push("HEAD:Main").await.is_err());
        assert!(vcs.pushes().is_empty());
    }
}
