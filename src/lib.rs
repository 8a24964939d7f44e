//! Save-and-publish API for The Classic tournament site.
//!
//! The admin page posts the whole tournament document to `/save`. After the
//! shared password and optional `meta.lastUpdated` lock check pass, the
//! document is written to the git working tree and the web root, then
//! committed and pushed so the repository history records every change.
//!
//! `/weather` proxies the current-conditions request so the API key stays on
//! the server.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`auth`]: Shared-secret verification
//! - [`document`]: Persisted copies of the tournament document
//! - [`vcs`]: Version-control capability (git CLI and mock)
//! - [`weather`]: Weather upstream client
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod utils;
pub mod vcs;
pub mod weather;

pub use config::Config;
pub use error::{ApiError, Result};
