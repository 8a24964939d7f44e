//! `/metrics` exposition after real requests. Installs the process-wide
//! recorder, so this binary holds a single test.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use classic_api::api::{create_router, AppState};
use classic_api::vcs::MockVcs;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;

use common::{get, post_save_json, TestEnv, PASSWORD};

#[tokio::test]
async fn save_counters_appear_in_exposition() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("install recorder");
    classic_api::metrics::init_metrics();

    let env = TestEnv::new();
    let state = AppState::new(env.config(&[]), Arc::new(MockVcs::new()))
        .expect("app state")
        .with_metrics(handle);
    let app = create_router(state);

    let saved = post_save_json(&app, json!({"password": PASSWORD, "data": {"a": 1}})).await;
    assert_eq!(saved.status, StatusCode::OK);
    let rejected = post_save_json(&app, json!({"password": "wrong", "data": {"a": 2}})).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);

    let response = get(&app, "/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.body).unwrap();
    assert!(text.contains("saves_total{outcome=\"committed\"} 1"), "{text}");
    assert!(
        text.contains("saves_rejected_total{reason=\"unauthorized\"} 1"),
        "{text}"
    );
}
