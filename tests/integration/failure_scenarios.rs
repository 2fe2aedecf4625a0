//! Integration tests for failure handling
//!
//! These tests verify that:
//! - A failed append is never broadcast
//! - A failed query reports `success: false` without data
//! - The pipeline recovers once the store does

use std::sync::Arc;
use std::time::Duration;

use sensor_relay::service::{IngestResponse, LatestResponse};

use crate::helpers::{FlakyStore, payload, service_with};

#[tokio::test]
async fn test_storage_failure_suppresses_broadcast() {
    let store = Arc::new(FlakyStore::new());
    let service = service_with(store.clone());
    let mut subscriber = service.broadcaster().subscribe().await.unwrap();

    store.fail_appends(true);
    let response = service.ingest(payload(Some(99.0), None)).await;

    assert_eq!(response, IngestResponse::failed("storage"));
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({"success": false, "error": "storage"})
    );

    let nothing = tokio::time::timeout(Duration::from_millis(100), subscriber.recv()).await;
    assert!(nothing.is_err(), "failed ingest must not be broadcast");

    let stats = service.broadcaster().stats().await.unwrap();
    assert_eq!(stats.published, 0);
}

#[tokio::test]
async fn test_pipeline_recovers_after_storage_failure() {
    let store = Arc::new(FlakyStore::new());
    let service = service_with(store.clone());
    let mut subscriber = service.broadcaster().subscribe().await.unwrap();

    store.fail_appends(true);
    service.ingest(payload(Some(1.0), None)).await;

    store.fail_appends(false);
    let response = service.ingest(payload(Some(2.0), None)).await;
    assert!(response.success);

    // the first reading delivered is the one that was stored
    let pushed = subscriber.recv().await.unwrap();
    assert_eq!(pushed.temperature, Some(2.0));
    assert_eq!(service.latest_readings(10).await.data.unwrap().len(), 1);
}

#[tokio::test]
async fn test_query_failure_has_no_data() {
    let store = Arc::new(FlakyStore::new());
    let service = service_with(store.clone());

    service.ingest(payload(Some(1.0), None)).await;
    store.fail_queries(true);

    let response = service.latest_readings(5).await;
    assert_eq!(response, LatestResponse::failed("storage"));
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({"success": false, "error": "storage"})
    );
}

#[tokio::test]
async fn test_broadcaster_shutdown_does_not_fail_ingest() {
    let service = crate::helpers::memory_service();
    service.broadcaster().shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = service.ingest(payload(None, Some(80.0))).await;
    assert_eq!(response, IngestResponse::accepted(true));
    assert_eq!(service.latest_readings(1).await.data.unwrap().len(), 1);
}
