//! Helper functions for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sensor_relay::{
    Reading, SensorPayload,
    actors::broadcaster::BroadcasterHandle,
    service::ReadingService,
    storage::{
        HealthStatus, MemoryBackend, NewReading, ReadingStore, StorageError, StorageResult,
    },
};

pub fn payload(temperature: Option<f64>, distance: Option<f64>) -> SensorPayload {
    SensorPayload {
        temperature,
        distance,
    }
}

/// Memory store whose operations can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryBackend,
    fail_appends: AtomicBool,
    fail_queries: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReadingStore for FlakyStore {
    async fn append(&self, reading: NewReading) -> StorageResult<Reading> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("disk full".to_string()));
        }
        self.inner.append(reading).await
    }

    async fn latest(&self, limit: usize) -> StorageResult<Vec<Reading>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("pool closed".to_string()));
        }
        self.inner.latest(limit).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn get_stats(&self) -> StorageResult<String> {
        self.inner.get_stats().await
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

pub fn memory_service() -> Arc<ReadingService> {
    service_with(Arc::new(MemoryBackend::new()))
}

pub fn service_with(store: Arc<dyn ReadingStore>) -> Arc<ReadingService> {
    Arc::new(ReadingService::new(store, BroadcasterHandle::spawn(64)))
}

/// Start a hub on a random local port
#[cfg(feature = "api")]
pub async fn spawn_test_hub(service: Arc<ReadingService>) -> std::net::SocketAddr {
    use sensor_relay::api::{ApiConfig, ApiState, spawn_api_server};

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
    };

    spawn_api_server(config, ApiState::new(service)).await.unwrap()
}
