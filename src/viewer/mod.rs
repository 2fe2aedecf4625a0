//! Observer dashboard
//!
//! Reconciles a one-shot snapshot of recent readings with the hub's live
//! stream into three views: current values, recent history and a time
//! series.

pub mod app;
pub mod client;
pub mod config;
pub mod session;
pub mod views;
pub mod websocket;

pub use app::Dashboard;
pub use client::{SnapshotClient, SnapshotError};
pub use config::Config;
pub use session::{LiveMessage, ObserverSession, ViewFeed};
pub use views::{CurrentMetrics, HistoryRing, SeedState, TimeSeries};
pub use websocket::{LiveClient, LiveEvent};
