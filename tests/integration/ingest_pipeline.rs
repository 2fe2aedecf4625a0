//! Integration tests for the ingest pipeline
//!
//! These tests verify that:
//! - Payloads are classified before they are stored
//! - The published reading is exactly the stored one
//! - The alert signal follows the distance/temperature thresholds

use pretty_assertions::assert_eq;
use sensor_relay::{DistanceStatus, TemperatureStatus, service::IngestResponse};
use std::time::Duration;

use crate::helpers::{memory_service, payload};

#[tokio::test]
async fn test_published_reading_matches_latest() {
    let service = memory_service();
    let mut subscriber = service.broadcaster().subscribe().await.unwrap();

    let response = service.ingest(payload(Some(55.0), Some(75.0))).await;
    assert!(response.success);

    let pushed = tokio::time::timeout(Duration::from_millis(500), subscriber.recv())
        .await
        .unwrap()
        .unwrap();
    let latest = service.latest_readings(1).await.data.unwrap();

    assert_eq!(latest, vec![pushed.clone()]);
    assert_eq!(
        serde_json::to_value(&latest[0]).unwrap(),
        serde_json::to_value(&pushed).unwrap()
    );
}

#[tokio::test]
async fn test_temperature_only_scenario() {
    let service = memory_service();

    let response = service.ingest(payload(Some(35.0), None)).await;
    assert_eq!(response, IngestResponse::accepted(false));

    let stored = &service.latest_readings(1).await.data.unwrap()[0];
    assert_eq!(stored.temperature_status, Some(TemperatureStatus::Cold));
    assert_eq!(stored.distance_status, None);

    let json = serde_json::to_value(stored).unwrap();
    assert!(json.get("distance_status").is_none());
    assert!(json.get("distance").is_none());
}

#[tokio::test]
async fn test_distance_only_scenario() {
    let service = memory_service();

    // 30 is VeryNear, but the alert only fires above 50
    let response = service.ingest(payload(None, Some(30.0))).await;
    assert_eq!(response, IngestResponse::accepted(false));

    let stored = &service.latest_readings(1).await.data.unwrap()[0];
    assert_eq!(stored.distance_status, Some(DistanceStatus::VeryNear));
    assert_eq!(stored.temperature_status, None);
}

#[tokio::test]
async fn test_both_fields_scenario() {
    let service = memory_service();

    let response = service.ingest(payload(Some(75.0), Some(200.0))).await;
    assert_eq!(response, IngestResponse::accepted(true));

    let stored = &service.latest_readings(1).await.data.unwrap()[0];
    assert_eq!(stored.temperature_status, Some(TemperatureStatus::VeryHot));
    assert_eq!(stored.distance_status, Some(DistanceStatus::Far));
}

#[tokio::test]
async fn test_empty_payload_is_stored_unclassified() {
    let service = memory_service();

    let response = service.ingest(payload(None, None)).await;
    assert_eq!(response, IngestResponse::accepted(false));

    let stored = &service.latest_readings(1).await.data.unwrap()[0];
    assert_eq!(stored.temperature, None);
    assert_eq!(stored.distance, None);
    assert_eq!(stored.temperature_status, None);
    assert_eq!(stored.distance_status, None);
}

#[tokio::test]
async fn test_empty_store_query() {
    let service = memory_service();

    let response = service.latest_readings(5).await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({"success": true, "data": []})
    );
}

#[tokio::test]
async fn test_late_subscriber_misses_earlier_readings() {
    let service = memory_service();

    service.ingest(payload(Some(20.0), None)).await;
    let mut subscriber = service.broadcaster().subscribe().await.unwrap();
    service.ingest(payload(Some(21.0), None)).await;

    let pushed = subscriber.recv().await.unwrap();
    assert_eq!(pushed.temperature, Some(21.0));
}
