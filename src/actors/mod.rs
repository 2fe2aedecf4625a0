//! Actor-based components
//!
//! Each actor runs as an independent async task and is driven through a
//! cloneable handle that sends commands over a Tokio mpsc channel.
//!
//! ## Architecture Overview
//!
//! ```text
//!   DeviceActor ──POST /data──▶ ReadingService ──append──▶ ReadingStore
//!                                     │
//!                                     │ publish (persisted reading)
//!                                     ▼
//!                             BroadcasterActor
//!                                     │ one bounded channel per subscriber
//!                       ┌─────────────┼─────────────┐
//!                       ▼             ▼             ▼
//!                   /ws conn      /ws conn      /ws conn
//! ```
//!
//! ## Actor Types
//!
//! - **BroadcasterActor**: Owns the live subscriber set and fans readings out
//! - **DeviceActor**: Simulated sensor posting readings to a hub
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for replies

pub mod broadcaster;
pub mod device;
pub mod messages;
