//! BroadcasterActor - Fans persisted readings out to live subscribers
//!
//! The subscriber map is owned by this actor alone. Every register, remove
//! and publish goes through its command channel, so they are applied one at a
//! time in arrival order and no lock is needed around the map.
//!
//! ## Message Flow
//!
//! ```text
//! ReadingService ──Publish──▶ BroadcasterActor ──try_send──▶ [sub-1, sub-2, ...]
//! Live endpoint ──Subscribe/Unsubscribe──▶ BroadcasterActor
//! ```
//!
//! ## Delivery
//!
//! Delivery is best-effort. Each subscriber has a bounded channel:
//!
//! - **Full**: the reading is dropped for that subscriber only
//! - **Closed**: the subscriber is gone; it is removed and the failure logged
//!
//! A publish never fails and never waits on a slow subscriber.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, instrument, trace, warn};

use crate::Reading;

use super::messages::{BroadcastCommand, BroadcastStats, Subscription, SubscriptionId};

/// Default capacity of each subscriber's channel
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Actor that owns the set of live subscribers
pub struct BroadcasterActor {
    /// Command receiver for control messages
    command_rx: mpsc::Receiver<BroadcastCommand>,

    /// Registered subscribers keyed by id
    subscribers: HashMap<SubscriptionId, mpsc::Sender<Reading>>,

    /// Next id to hand out; ids are never reused
    next_id: u64,

    /// Capacity of each subscriber channel
    buffer: usize,

    stats: BroadcastStats,
}

impl BroadcasterActor {
    /// Create a new broadcaster actor
    pub fn new(command_rx: mpsc::Receiver<BroadcastCommand>, buffer: usize) -> Self {
        Self {
            command_rx,
            subscribers: HashMap::new(),
            next_id: 1,
            buffer: buffer.max(1),
            stats: BroadcastStats::default(),
        }
    }

    /// Run the actor's main loop
    ///
    /// This runs until a Shutdown command is received or every handle has
    /// been dropped. Dropping the subscriber map on exit closes every
    /// subscription.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting broadcaster actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                BroadcastCommand::Subscribe { respond_to } => {
                    let subscription = self.subscribe();
                    let id = subscription.id;
                    if respond_to.send(subscription).is_err() {
                        // caller went away before the reply; don't keep a dead entry
                        self.subscribers.remove(&id);
                    }
                }

                BroadcastCommand::Unsubscribe { id, respond_to } => {
                    let removed = self.subscribers.remove(&id).is_some();
                    if removed {
                        debug!("unsubscribed {id}");
                    } else {
                        trace!("unsubscribe for unknown {id}");
                    }
                    let _ = respond_to.send(removed);
                }

                BroadcastCommand::Publish {
                    reading,
                    respond_to,
                } => {
                    let delivered = self.publish(reading);
                    let _ = respond_to.send(delivered);
                }

                BroadcastCommand::GetStats { respond_to } => {
                    let mut stats = self.stats;
                    stats.subscribers = self.subscribers.len();
                    let _ = respond_to.send(stats);
                }

                BroadcastCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!(
            "broadcaster actor stopped, closing {} subscriptions",
            self.subscribers.len()
        );
    }

    fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.insert(id, tx);

        debug!("subscribed {id} ({} total)", self.subscribers.len());
        Subscription { id, receiver: rx }
    }

    /// Queue a reading for every subscriber
    ///
    /// Returns the number of subscribers the reading was queued for.
    fn publish(&mut self, reading: Reading) -> usize {
        self.stats.published += 1;

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx) in &self.subscribers {
            match tx.try_send(reading.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.stats.dropped += 1;
                    debug!("subscriber {id} is lagging, dropped reading #{}", reading.id);
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            self.subscribers.remove(&id);
            self.stats.delivery_failures += 1;
            warn!("delivery to {id} failed, subscriber removed");
        }

        trace!("published reading #{} to {delivered} subscribers", reading.id);
        delivered
    }
}

/// Handle for controlling a BroadcasterActor
///
/// This handle provides a typed API for sending commands to the actor.
/// It can be cloned and shared across threads.
#[derive(Clone)]
pub struct BroadcasterHandle {
    sender: mpsc::Sender<BroadcastCommand>,
}

impl BroadcasterHandle {
    /// Spawn a new broadcaster actor
    ///
    /// `buffer` is the capacity of each subscriber's channel.
    pub fn spawn(buffer: usize) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);

        let actor = BroadcasterActor::new(cmd_rx, buffer);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Register a new subscriber
    pub async fn subscribe(&self) -> Result<Subscription> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BroadcastCommand::Subscribe { respond_to: tx })
            .await
            .context("failed to send Subscribe command")?;

        rx.await.context("failed to receive subscription")
    }

    /// Remove a subscriber
    ///
    /// Idempotent. Returns `false` when the subscriber was already removed or
    /// the broadcaster is no longer running.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(BroadcastCommand::Unsubscribe { id, respond_to: tx })
            .await
            .is_err()
        {
            return false;
        }

        rx.await.unwrap_or(false)
    }

    /// Hand a reading to every current subscriber
    ///
    /// Never fails. Returns the number of subscribers the reading was queued
    /// for, which is zero when the broadcaster is no longer running.
    pub async fn publish(&self, reading: Reading) -> usize {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(BroadcastCommand::Publish {
                reading,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            debug!("broadcaster is not running, reading not published");
            return 0;
        }

        rx.await.unwrap_or(0)
    }

    /// Get broadcaster statistics
    pub async fn stats(&self) -> Result<BroadcastStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BroadcastCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive stats")
    }

    /// Gracefully shut down the broadcaster
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(BroadcastCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
