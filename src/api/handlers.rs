//! HTTP API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::auth::Credential;
use crate::config::Config;
use crate::document::DocumentStore;
use crate::error::{ApiError, Result, WeatherError};
use crate::metrics;
use crate::vcs::{CommitOutcome, VersionControlClient};
use crate::weather::WeatherClient;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Save credential.
    credential: Credential,
    /// The two persisted copies.
    documents: DocumentStore,
    /// Publishes saved documents.
    vcs: Arc<dyn VersionControlClient>,
    /// Weather upstream.
    weather: WeatherClient,
    /// Serializes the save sequence across requests.
    save_lock: Arc<Mutex<()>>,
    /// Prometheus recorder handle, when installed.
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        config: Config,
        vcs: Arc<dyn VersionControlClient>,
    ) -> std::result::Result<Self, WeatherError> {
        let weather = WeatherClient::new(&config)?;
        Ok(Self {
            credential: Credential::from_config(&config),
            documents: DocumentStore::from_config(&config),
            config: Arc::new(config),
            vcs,
            weather,
            save_lock: Arc::new(Mutex::new(())),
            metrics: None,
        })
    }

    /// Attach a Prometheus handle rendered on `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Save response.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Always true; failures are reported as errors.
    pub success: bool,
}

/// Validated `/save` payload.
#[derive(Debug)]
struct SaveRequest {
    password: String,
    data: Value,
    expected_last_updated: Option<Value>,
}

impl SaveRequest {
    /// Parse the body. Field checks happen in the handler so that
    /// authentication is decided before data validation.
    fn parse(body: &[u8]) -> Result<Self> {
        let mut payload: Value =
            serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;

        let password = payload
            .get("password")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let expected_last_updated = payload
            .get_mut("expectedLastUpdated")
            .map(Value::take)
            .filter(is_set);
        let data = payload
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);

        Ok(Self {
            password,
            data,
            expected_last_updated,
        })
    }
}

/// Whether a lock marker was supplied. Null, `false`, `0` and `""` count as absent.
fn is_set(marker: &Value) -> bool {
    match marker {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Map a body extraction failure; only the size limit gets its own status.
fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Rejected save body over the size limit");
        metrics::inc_saves_rejected("too_large");
        ApiError::PayloadTooLarge
    } else {
        metrics::inc_saves_rejected("invalid_json");
        ApiError::InvalidJson
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus exposition, or 404 when no recorder is installed.
pub async fn prometheus(State(state): State<AppState>) -> Result<Response> {
    let handle = state.metrics.as_ref().ok_or(ApiError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Save handler - authenticate, lock-check, write both copies, commit and push.
#[instrument(skip_all, fields(bytes = tracing::field::Empty))]
pub async fn save(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<SaveResponse>> {
    let body = body.map_err(body_rejection)?;
    tracing::Span::current().record("bytes", body.len());
    let request = SaveRequest::parse(&body).inspect_err(|_| {
        metrics::inc_saves_rejected("invalid_json");
    })?;

    if !state.credential.verify(&request.password) {
        warn!("Rejected save with invalid password");
        metrics::inc_saves_rejected("unauthorized");
        return Err(ApiError::InvalidPassword);
    }

    let Value::Object(data) = request.data else {
        metrics::inc_saves_rejected("invalid_data");
        return Err(ApiError::InvalidData);
    };

    let _timer = metrics::timer_save();
    let _guard = state.save_lock.lock().await;

    if let Some(expected) = request.expected_last_updated.as_ref() {
        match state.documents.current_last_updated().await {
            Some(current) if expected.as_str() != Some(current.as_str()) => {
                info!(%current, %expected, "Rejected stale save");
                metrics::inc_saves_rejected("conflict");
                return Err(ApiError::Conflict);
            }
            Some(_) => {}
            None => {
                warn!("Skipping optimistic-lock check, current marker unavailable");
                metrics::inc_saves_lock_skipped();
            }
        }
    }

    state.documents.write(&data).await?;

    let outcome = state
        .vcs
        .stage_and_commit(state.documents.repo_path(), &state.config.commit_message)
        .await
        .inspect_err(|_| metrics::inc_git_failures())?;

    if outcome == CommitOutcome::Committed {
        state
            .vcs
            .push(&state.config.push_refspec())
            .await
            .inspect_err(|_| metrics::inc_git_failures())?;
    }

    info!(%outcome, "Saved tournament data");
    metrics::inc_saves(outcome);
    Ok(Json(SaveResponse { success: true }))
}

/// Weather proxy handler - upstream body and status on success, 502 otherwise.
#[instrument(skip(state))]
pub async fn weather(State(state): State<AppState>) -> Result<Response> {
    let start = Instant::now();

    match state.weather.current().await {
        Ok(None) => {
            metrics::inc_weather_requests("unconfigured");
            Err(ApiError::WeatherNotConfigured)
        }
        Ok(Some(upstream)) => {
            metrics::record_weather_latency(start);
            metrics::inc_weather_requests("ok");
            Ok((
                upstream.status,
                [
                    (header::CONTENT_TYPE, "application/json"),
                    (header::CACHE_CONTROL, "public, max-age=300"),
                ],
                upstream.body,
            )
                .into_response())
        }
        Err(e) => {
            metrics::record_weather_latency(start);
            metrics::inc_weather_requests("error");
            Err(e.into())
        }
    }
}
