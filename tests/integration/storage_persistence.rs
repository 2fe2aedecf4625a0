//! Integration tests for storage persistence
//!
//! These tests verify that:
//! - Readings survive closing and reopening the database file
//! - Ids keep increasing across restarts
//! - The service reads back exactly what it stored

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sensor_relay::storage::{ReadingStore, sqlite::SqliteBackend};
use tempfile::tempdir;

use crate::helpers::{payload, service_with};

#[tokio::test]
async fn test_readings_survive_restart() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("readings.db");

    let before = {
        let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let service = service_with(backend.clone());

        assert!(service.ingest(payload(Some(36.6), None)).await.success);
        assert!(service.ingest(payload(None, Some(120.0))).await.success);

        let stored = service.latest_readings(10).await.data.unwrap();
        backend.close().await.unwrap();
        stored
    };

    // Reopen the same file
    let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let after = backend.latest(10).await.unwrap();

    assert_eq!(after, before);
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].distance, Some(120.0));
    assert_eq!(after[1].temperature, Some(36.6));
}

#[tokio::test]
async fn test_ids_continue_after_restart() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("readings.db");

    let first_id = {
        let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let service = service_with(backend.clone());
        service.ingest(payload(Some(10.0), None)).await;

        let id = backend.latest(1).await.unwrap()[0].id;
        backend.close().await.unwrap();
        id
    };

    let backend = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let service = service_with(backend.clone());
    service.ingest(payload(Some(11.0), None)).await;

    let latest = backend.latest(2).await.unwrap();
    assert!(latest[0].id > first_id);
    assert!(latest[0].created_at >= latest[1].created_at);
}

#[tokio::test]
async fn test_published_reading_matches_persisted_row() {
    let temp_dir = tempdir().unwrap();
    let backend = Arc::new(
        SqliteBackend::new(temp_dir.path().join("readings.db"))
            .await
            .unwrap(),
    );
    let service = service_with(backend);
    let mut subscriber = service.broadcaster().subscribe().await.unwrap();

    service.ingest(payload(Some(71.25), Some(49.5))).await;

    let pushed = subscriber.recv().await.unwrap();
    let stored = service.latest_readings(1).await.data.unwrap();

    // created_at round-trips through the millisecond column unchanged
    assert_eq!(stored, vec![pushed]);
}
