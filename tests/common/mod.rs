//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use classic_api::api::{create_router, AppState};
use classic_api::vcs::VersionControlClient;
use classic_api::Config;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "classic2026";
pub const ORIGIN: &str = "https://theclassicgolf.org";

/// Temporary repository and web root directories.
pub struct TestEnv {
    _dir: TempDir,
    pub repo: PathBuf,
    pub web: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = dir.path().join("repo");
        let web = dir.path().join("web");
        std::fs::create_dir_all(&repo).expect("create repo dir");
        std::fs::create_dir_all(&web).expect("create web dir");
        Self {
            _dir: dir,
            repo,
            web,
        }
    }

    /// Config pointing at the temp directories, plus `extra` overrides.
    pub fn config(&self, extra: &[(&str, &str)]) -> Config {
        let mut pairs: Vec<(String, String)> = vec![
            ("SAVE_PASSWORD".into(), PASSWORD.into()),
            ("REPO_DIR".into(), self.repo.display().to_string()),
            ("WEB_DIR".into(), self.web.display().to_string()),
        ];
        // Overrides replace defaults; duplicate keys would fail deserialization.
        pairs.retain(|(k, _)| !extra.iter().any(|(key, _)| key == k));
        pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Config::from_pairs(pairs).expect("valid test config")
    }

    pub fn repo_copy(&self) -> Option<Vec<u8>> {
        std::fs::read(self.repo.join("data.json")).ok()
    }

    pub fn web_copy(&self) -> Option<Vec<u8>> {
        std::fs::read(self.web.join("data.json")).ok()
    }
}

pub fn app(config: Config, vcs: Arc<dyn VersionControlClient>) -> Router {
    create_router(AppState::new(config, vcs).expect("app state"))
}

/// Response status, headers and JSON body (`Value::Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.body).expect("json body")
        }
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn post_save(app: &Router, body: impl Into<Body>) -> TestResponse {
    send(
        app,
        Request::builder()
            .method(Method::POST)
            .uri("/save")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("request"),
    )
    .await
}

pub async fn post_save_json(app: &Router, body: Value) -> TestResponse {
    post_save(app, body.to_string()).await
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).expect("request"),
    )
    .await
}
