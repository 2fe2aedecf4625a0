//! Storage backends for reading persistence
//!
//! This module provides a trait-based abstraction for the append-only
//! reading log.
//!
//! ## Design
//!
//! - **Trait-based**: `ReadingStore` trait allows swapping implementations
//! - **Async**: All operations are async so handlers can await them directly
//! - **Append-only**: Readings are never updated or deleted
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database with WAL mode
//! - **In-Memory**: No persistence, for testing or throwaway hubs
//!
//! ## Usage
//!
//! ```no_run
//! use sensor_relay::storage::{ReadingStore, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./readings.db").await?;
//!     let latest = backend.latest(5).await?;
//!     println!("{} readings", latest.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, ReadingStore};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::NewReading;
