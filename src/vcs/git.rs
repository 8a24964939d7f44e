//! `git` subprocess implementation of [`VersionControlClient`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::{CommitOutcome, VersionControlClient};
use crate::config::Config;
use crate::error::VcsError;

/// Marker git prints when a commit has no changes.
const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// Runs `git` inside a fixed working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Repository working tree.
    repo_dir: PathBuf,
    /// Remote that receives pushes.
    remote: String,
    /// Program to execute, normally `git`.
    program: PathBuf,
}

impl GitCli {
    /// Create a client for `repo_dir` pushing to `remote`.
    pub fn new(repo_dir: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            remote: remote.into(),
            program: PathBuf::from("git"),
        }
    }

    /// Create a client from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.repo_dir, &config.git_remote)
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Path of `path` relative to the working tree.
    fn relative<'a>(&self, path: &'a Path) -> Result<&'a Path, VcsError> {
        match path.strip_prefix(&self.repo_dir) {
            Ok(rel) => Ok(rel),
            Err(_) if path.is_relative() => Ok(path),
            Err(_) => Err(VcsError::OutsideRepository {
                path: path.display().to_string(),
            }),
        }
    }

    async fn run<I, S>(&self, command: &'static str, args: I) -> Result<Output, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .arg(command)
            .args(args)
            .current_dir(&self.repo_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| VcsError::Spawn { command, source })?;

        debug!(command, status = ?output.status.code(), "git finished");
        Ok(output)
    }

    /// Run a subcommand and fail on a non-zero exit.
    async fn run_checked<I, S>(&self, command: &'static str, args: I) -> Result<Output, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run(command, args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(VcsError::CommandFailed {
                command,
                output: diagnostic(&output),
            })
        }
    }
}

/// Stderr if present, otherwise stdout, trimmed.
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// True when a failed commit only reported that there was nothing to commit.
pub fn is_nothing_to_commit(output: &str) -> bool {
    output.contains(NOTHING_TO_COMMIT)
}

#[async_trait]
impl VersionControlClient for GitCli {
    #[instrument(skip(self, message), fields(repo = %self.repo_dir.display()))]
    async fn stage_and_commit(
        &self,
        path: &Path,
        message: &str,
    ) -> Result<CommitOutcome, VcsError> {
        let rel = self.relative(path)?;

        self.run_checked("add", [OsStr::new("--"), rel.as_os_str()])
            .await?;

        // Exit 0 means the index matches HEAD for this path.
        let diff = self
            .run(
                "diff",
                [
                    OsStr::new("--cached"),
                    OsStr::new("--quiet"),
                    OsStr::new("--"),
                    rel.as_os_str(),
                ],
            )
            .await?;
        match diff.status.code() {
            Some(0) => {
                info!("No changes staged, skipping commit");
                return Ok(CommitOutcome::NoOp);
            }
            Some(1) => {}
            _ => {
                return Err(VcsError::CommandFailed {
                    command: "diff",
                    output: diagnostic(&diff),
                })
            }
        }

        let commit = self
            .run(
                "commit",
                [
                    OsStr::new("-m"),
                    OsStr::new(message),
                    OsStr::new("--"),
                    rel.as_os_str(),
                ],
            )
            .await?;
        if !commit.status.success() {
            let stdout = String::from_utf8_lossy(&commit.stdout);
            let stderr = String::from_utf8_lossy(&commit.stderr);
            if is_nothing_to_commit(&stdout) || is_nothing_to_commit(&stderr) {
                info!("Commit reported nothing to commit");
                return Ok(CommitOutcome::NoOp);
            }
            return Err(VcsError::CommandFailed {
                command: "commit",
                output: diagnostic(&commit),
            });
        }

        info!("Committed {}", rel.display());
        Ok(CommitOutcome::Committed)
    }

    #[instrument(skip(self), fields(remote = %self.remote))]
    async fn push(&self, refspec: &str) -> Result<(), VcsError> {
        self.run_checked("push", [self.remote.as_str(), refspec])
            .await?;
        info!("Pushed {} to {}", refspec, self.remote);
        Ok(())
    }
}
