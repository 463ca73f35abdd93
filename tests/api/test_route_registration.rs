// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Route registration: health, trailing slashes, CORS and the 404 fallback

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use image_analysis_node::{
    analysis::{AnalysisService, AnalysisSettings},
    api::http_server::{create_app, AppState},
    auth::SameAccountPolicy,
    config::AppConfig,
    quota::{InMemoryQuotaStore, QuotaLimiter},
    storage::MockObjectStore,
    vision::StaticVisionService,
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tower::util::ServiceExt; // for `oneshot`

fn setup_app() -> Router {
    let vars: HashMap<String, String> = [
        ("BUCKET_NAME", "route-bucket"),
        ("OBJECT_STORE_ENDPOINT", "http://objects.test"),
        ("VISION_ENDPOINT", "http://vision.test"),
        ("QUOTA_TABLE", "quota"),
        ("QUOTA_STORE_ENDPOINT", "memory"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = AppConfig::from_vars(&vars).unwrap();

    let analysis = AnalysisService::new(
        Arc::new(MockObjectStore::new()),
        Arc::new(StaticVisionService::default()),
        AnalysisSettings {
            bucket: config.bucket.clone(),
            upload_prefix: config.upload_prefix.clone(),
            max_labels: config.max_labels,
        },
    );

    create_app(AppState {
        quota: Some(Arc::new(QuotaLimiter::new(
            Arc::new(InMemoryQuotaStore::new()),
            config.quota.limit,
        ))),
        analysis: Arc::new(analysis),
        bypass: Arc::new(SameAccountPolicy::new(None)),
        config: Arc::new(config),
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_bucket_and_quota() {
    let (status, json) = get(setup_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["bucket"], "route-bucket");
    assert_eq!(json["quota_enabled"], true);
}

#[tokio::test]
async fn test_trailing_slash_is_accepted() {
    let (status, _) = get(setup_app(), "/health/").await;
    assert_eq!(status, StatusCode::OK);

    let response = setup_app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/analyze/")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let (status, json) = get(setup_app(), "/v1/models").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"ok": false, "message": "Not Found"}));
}

#[tokio::test]
async fn test_cors_preflight() {
    let response = setup_app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/analyze")
                .header("origin", "https://app.example.com")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type,x-client-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
    let methods = response.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
}
