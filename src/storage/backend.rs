//! Storage backend trait definition
//!
//! This module defines the `ReadingStore` trait that all storage
//! implementations must implement.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::NewReading;
use crate::Reading;

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: HashMap<String, String>,
}

/// Trait for append-only reading stores
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; a single store is shared by every
/// concurrent ingest and query request.
///
/// ## Consistency
///
/// - `append` is atomic: either the reading is recorded (and returned with
///   its id and final `created_at`) or an error is returned and nothing is
///   recorded.
/// - `latest` observes every `append` that completed before it started.
///   Appends still in flight may or may not be visible.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist a reading and return it as stored
    ///
    /// Assigns the id, and `created_at` when the caller left it empty. The
    /// assigned `created_at` is never earlier than that of the previously
    /// appended reading.
    async fn append(&self, reading: NewReading) -> StorageResult<Reading>;

    /// The `limit` most recently appended readings, newest first
    async fn latest(&self, limit: usize) -> StorageResult<Vec<Reading>>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get backend-specific statistics
    ///
    /// Returns human-readable stats about the backend
    /// (e.g., "SQLite: 1200 readings").
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
