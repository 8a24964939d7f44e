//! Version-control capability used to publish saved documents.
//!
//! The save handler depends only on [`VersionControlClient`]. [`GitCli`]
//! drives the `git` binary; [`MockVcs`] records calls for tests.

pub mod git;
pub mod mock;

use std::path::Path;

use async_trait::async_trait;
use strum::{AsRefStr, Display};

use crate::error::VcsError;

pub use git::GitCli;
pub use mock::{MockVcs, MockVcsConfig};

/// Result of a stage-and-commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CommitOutcome {
    /// A new commit was created.
    Committed,
    /// Nothing changed since the last commit; no commit was made.
    #[strum(to_string = "noop")]
    NoOp,
}

/// Stage, commit and push a single tracked file.
#[async_trait]
pub trait VersionControlClient: Send + Sync {
    /// Stage `path` and commit it with `message` if it differs from HEAD.
    async fn stage_and_commit(&self, path: &Path, message: &str)
        -> Result<CommitOutcome, VcsError>;

    /// Push to the configured remote using `refspec` (e.g. `HEAD:Main`).
    async fn push(&self, refspec: &str) -> Result<(), VcsError>;
}
