//! Message types for actor communication
//!
//! This module defines all message types used for communication between actors.
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to specific actors via mpsc
//! 2. **Replies**: Returned over a oneshot channel carried in the command

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{Reading, SensorPayload, service::IngestResponse};

/// Identifier of one live subscriber of the broadcaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a broadcaster subscription
///
/// Readings arrive in publish order. The channel is bounded; when the
/// subscriber falls behind, the broadcaster drops readings for it instead of
/// waiting.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::Receiver<Reading>,
}

impl Subscription {
    /// Wait for the next reading
    ///
    /// Returns `None` once the broadcaster has removed this subscriber or
    /// shut down.
    pub async fn recv(&mut self) -> Option<Reading> {
        self.receiver.recv().await
    }
}

/// Commands that can be sent to the BroadcasterActor
#[derive(Debug)]
pub enum BroadcastCommand {
    /// Register a new subscriber
    Subscribe {
        respond_to: oneshot::Sender<Subscription>,
    },

    /// Remove a subscriber
    ///
    /// Replies `false` when the id was not registered (already removed).
    Unsubscribe {
        id: SubscriptionId,
        respond_to: oneshot::Sender<bool>,
    },

    /// Hand a reading to every current subscriber
    ///
    /// Replies with the number of subscribers the reading was queued for.
    Publish {
        reading: Reading,
        respond_to: oneshot::Sender<usize>,
    },

    /// Get broadcaster statistics
    GetStats {
        respond_to: oneshot::Sender<BroadcastStats>,
    },

    /// Gracefully shut down the broadcaster
    ///
    /// Every subscription channel is closed.
    Shutdown,
}

/// Broadcaster statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastStats {
    /// Currently registered subscribers
    pub subscribers: usize,

    /// Readings published since startup
    pub published: u64,

    /// Deliveries skipped because a subscriber's channel was full
    pub dropped: u64,

    /// Subscribers removed because their channel was closed
    pub delivery_failures: u64,
}

/// Commands that can be sent to a DeviceActor
#[derive(Debug)]
pub enum DeviceCommand {
    /// Post a payload right away (bypassing the interval timer)
    ///
    /// Used for testing and manual sends.
    SendNow {
        payload: SensorPayload,
        respond_to: oneshot::Sender<anyhow::Result<IngestResponse>>,
    },

    /// Gracefully shut down the device
    Shutdown,
}
