// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HttpVisionClient against a local stub detection service

use axum::{routing::post, Json, Router};
use image_analysis_node::{
    storage::ObjectRef,
    vision::{consolidate_lines, HttpVisionClient, VisionError, VisionService},
};
use serde_json::{json, Value};
use std::{net::SocketAddr, time::Duration};

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> HttpVisionClient {
    HttpVisionClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_mixed_payload_keeps_good_detections() {
    let router = Router::new().route(
        "/detect-text",
        post(|Json(request): Json<Value>| async move {
            assert_eq!(request["Image"]["S3Object"]["Bucket"], "bucket");
            Json(json!({
                "TextDetections": [
                    {"Type": "LINE", "DetectedText": "Total: 42", "Confidence": 98.0,
                     "Geometry": {"BoundingBox": {"Left": 0.1, "Top": 0.8, "Width": 0.3, "Height": 0.05}}},
                    {"Type": "LINE", "DetectedText": "missing top", "Confidence": 98.0,
                     "Geometry": {"BoundingBox": {"Left": 0.1, "Width": 0.3, "Height": 0.05}}},
                    {"DetectedText": "missing type", "Confidence": 98.0,
                     "Geometry": {"BoundingBox": {"Left": 0.1, "Top": 0.2, "Width": 0.3, "Height": 0.05}}}
                ]
            }))
        }),
    );
    let addr = spawn_stub(router).await;

    let detections = client(addr)
        .detect_text(&ObjectRef::new("bucket", "uploads/a.png"))
        .await
        .expect("one bad detection must not fail the call");
    assert_eq!(detections.len(), 1);

    let lines = consolidate_lines(&detections, 55.0);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "Total: 42");
}

#[tokio::test]
async fn test_labels_request_and_response() {
    let router = Router::new().route(
        "/detect-labels",
        post(|Json(request): Json<Value>| async move {
            assert_eq!(request["MaxLabels"], 5);
            assert_eq!(request["MinConfidence"], 70.0);
            Json(json!({
                "Labels": [{"Name": "Cat", "Confidence": 96.0, "Parents": [{"Name": "Animal"}]}]
            }))
        }),
    );
    let addr = spawn_stub(router).await;

    let labels = client(addr)
        .detect_labels(&ObjectRef::new("bucket", "uploads/cat.jpg"), 5, 70.0)
        .await
        .unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "Cat");
    assert_eq!(labels[0].parents, vec!["Animal"]);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let router = Router::new().route(
        "/detect-text",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = spawn_stub(router).await;

    let result = client(addr)
        .detect_text(&ObjectRef::new("bucket", "uploads/a.png"))
        .await;
    assert!(matches!(result, Err(VisionError::Status { status: 500, .. })));
}
