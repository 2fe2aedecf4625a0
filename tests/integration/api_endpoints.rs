//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Ingest and latest-readings endpoints return the documented bodies
//! - Malformed requests are rejected with 400
//! - Storage failures surface as 500
//! - WebSocket observers receive readings after they are ingested

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{FlakyStore, memory_service, payload, service_with, spawn_test_hub};

#[tokio::test]
async fn test_post_then_latest() {
    let addr = spawn_test_hub(memory_service()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/data", addr))
        .json(&json!({"temperature": 75, "distance": 200}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "alert": true}));

    let body: Value = client
        .get(format!("http://{}/data/latest?count=1", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["temperature_status"], "VeryHot");
    assert_eq!(data[0]["distance_status"], "Far");
}

#[tokio::test]
async fn test_latest_defaults_to_five_newest_first() {
    let service = memory_service();
    for i in 0..7 {
        service.ingest(payload(Some(i as f64), None)).await;
    }
    let addr = spawn_test_hub(service).await;

    let body: Value = reqwest::get(format!("http://{}/data/latest", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let temperatures: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["temperature"].as_f64().unwrap())
        .collect();
    assert_eq!(temperatures, vec![6.0, 5.0, 4.0, 3.0, 2.0]);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let service = memory_service();
    let addr = spawn_test_hub(service.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/data", addr))
        .header("content-type", "application/json")
        .body("{\"temperature\": \"hot\"}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    // nothing was stored
    assert!(service.latest_readings(5).await.data.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_count_is_rejected() {
    let addr = spawn_test_hub(memory_service()).await;

    for query in ["count=abc", "count=-3", "count=0"] {
        let response = reqwest::get(format!("http://{}/data/latest?{}", addr, query))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {query}");
    }
}

#[tokio::test]
async fn test_storage_failure_returns_500() {
    let store = Arc::new(FlakyStore::new());
    store.fail_appends(true);
    let addr = spawn_test_hub(service_with(store)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/data", addr))
        .json(&json!({"temperature": 20}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "error": "storage"}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = spawn_test_hub(memory_service()).await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[cfg(feature = "dashboard")]
#[tokio::test]
async fn test_websocket_receives_ingested_reading() {
    use futures::StreamExt;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    let service = memory_service();
    let addr = spawn_test_hub(service.clone()).await;

    let (mut socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

    // Wait for the connection to register with the broadcaster
    for _ in 0..50 {
        if service.broadcaster().stats().await.unwrap().subscribers == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let response = reqwest::Client::new()
        .post(format!("http://{}/data", addr))
        .json(&json!({"distance": 30}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "alert": false}));

    let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let Message::Text(text) = message else {
        panic!("expected a text frame, got {message:?}");
    };
    let pushed: Value = serde_json::from_str(&text).unwrap();
    let stored = serde_json::to_value(&service.latest_readings(1).await.data.unwrap()[0]).unwrap();

    assert_eq!(pushed, stored);
    assert_eq!(pushed["distance_status"], "VeryNear");
}

#[cfg(feature = "dashboard")]
#[tokio::test]
async fn test_websocket_close_unsubscribes() {
    use std::time::Duration;
    use tokio_tungstenite::connect_async;

    let service = memory_service();
    let addr = spawn_test_hub(service.clone()).await;

    let (mut socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    for _ in 0..50 {
        if service.broadcaster().stats().await.unwrap().subscribers == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    socket.close(None).await.unwrap();
    drop(socket);

    let mut subscribers = usize::MAX;
    for _ in 0..100 {
        subscribers = service.broadcaster().stats().await.unwrap().subscribers;
        if subscribers == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(subscribers, 0);

    // ingest still works with no observers
    assert!(service.ingest(payload(Some(1.0), None)).await.success);
}
