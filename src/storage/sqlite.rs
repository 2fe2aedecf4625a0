//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `ReadingStore` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Readers are not blocked by the single writer
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Write ordering
//!
//! Appends go through a write gate and run inside a transaction that reads the
//! previous row's `created_at` before inserting. Ids (`INTEGER PRIMARY KEY`)
//! and timestamps therefore increase together in insertion order.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, trace, warn};

use super::backend::{HealthStatus, ReadingStore};
use super::error::{StorageError, StorageResult};
use super::schema::{NewReading, next_created_at};
use crate::Reading;

/// Bound on how long a statement waits for the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
    write_gate: Mutex<()>,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create the `readings` table
    /// 3. Configure SQLite for WAL mode
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use sensor_relay::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./readings.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(BUSY_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        info!("SQLite connection pool created");

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
            write_gate: Mutex::new(()),
        })
    }

    /// Helper to convert timestamp to Unix milliseconds for SQLite
    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    /// Helper to convert Unix milliseconds from SQLite to DateTime
    fn millis_to_timestamp(millis: i64) -> StorageResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| StorageError::CorruptRow(format!("timestamp out of range: {millis}")))
    }

    fn row_to_reading(row: &SqliteRow) -> StorageResult<Reading> {
        let temperature_status = row
            .try_get::<Option<String>, _>("temperature_status")?
            .map(|s| s.parse())
            .transpose()
            .map_err(StorageError::CorruptRow)?;

        let distance_status = row
            .try_get::<Option<String>, _>("distance_status")?
            .map(|s| s.parse())
            .transpose()
            .map_err(StorageError::CorruptRow)?;

        Ok(Reading {
            id: row.try_get("id")?,
            temperature: row.try_get("temperature")?,
            distance: row.try_get("distance")?,
            temperature_status,
            distance_status,
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?)?,
        })
    }
}

#[async_trait]
impl ReadingStore for SqliteBackend {
    #[instrument(skip_all)]
    async fn append(&self, reading: NewReading) -> StorageResult<Reading> {
        let _gate = self.write_gate.lock().await;

        let mut tx = self.pool.begin().await?;

        let previous =
            sqlx::query_scalar::<_, i64>("SELECT created_at FROM readings ORDER BY id DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?
                .map(Self::millis_to_timestamp)
                .transpose()?;

        let created_at = next_created_at(reading.created_at, previous);

        let result = sqlx::query(
            r#"
            INSERT INTO readings (
                temperature, distance, temperature_status, distance_status, created_at
            )
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(reading.temperature)
        .bind(reading.distance)
        .bind(reading.temperature_status.map(|s| s.as_str()))
        .bind(reading.distance_status.map(|s| s.as_str()))
        .bind(Self::timestamp_to_millis(&created_at))
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        tx.commit().await?;

        trace!("appended reading #{id} at {created_at}");
        Ok(reading.into_reading(id, created_at))
    }

    #[instrument(skip(self))]
    async fn latest(&self, limit: usize) -> StorageResult<Vec<Reading>> {
        debug!("querying latest {} readings", limit);

        let rows = sqlx::query(
            r#"
            SELECT id, temperature, distance, temperature_status, distance_status, created_at
            FROM readings
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let readings = rows
            .iter()
            .map(Self::row_to_reading)
            .collect::<StorageResult<Vec<_>>>()?;

        debug!("query returned {} readings", readings.len());
        Ok(readings)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let (total_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM readings")
            .fetch_one(&self.pool)
            .await?;

        Ok(format!("SQLite: {} readings ({})", total_rows, self.db_path))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
