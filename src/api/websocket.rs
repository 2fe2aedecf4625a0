//! WebSocket handler for real-time reading streaming
//!
//! Each connection moves through `Connecting → Open → Closed`. It subscribes
//! to the broadcaster when it opens and forwards every published reading as
//! a JSON text frame. Inbound frames are ignored apart from Close.
//!
//! The observer closing the socket and a failed send both end in the same
//! `LiveConnection::close`, which unsubscribes exactly once.

use std::fmt;

use anyhow::{Result, bail};
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::{
    actors::{
        broadcaster::BroadcasterHandle,
        messages::{Subscription, SubscriptionId},
    },
    api::state::ApiState,
};

/// Lifecycle of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open(SubscriptionId),
    Closed,
}

/// Why a live connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The observer sent Close or its stream ended
    ObserverClosed,

    /// Writing a frame failed; treated as a disconnect
    SendFailed,

    /// The broadcaster dropped the subscription
    BroadcasterGone,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ObserverClosed => write!(f, "observer closed"),
            CloseReason::SendFailed => write!(f, "send failed"),
            CloseReason::BroadcasterGone => write!(f, "broadcaster gone"),
        }
    }
}

/// Broadcaster registration of one live connection
pub struct LiveConnection {
    state: ConnectionState,
    broadcaster: BroadcasterHandle,
}

impl LiveConnection {
    pub fn new(broadcaster: BroadcasterHandle) -> Self {
        Self {
            state: ConnectionState::Connecting,
            broadcaster,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Subscribe to the broadcaster
    ///
    /// Only valid while `Connecting`.
    pub async fn open(&mut self) -> Result<Subscription> {
        if self.state != ConnectionState::Connecting {
            bail!("connection is already {:?}", self.state);
        }

        match self.broadcaster.subscribe().await {
            Ok(subscription) => {
                self.state = ConnectionState::Open(subscription.id);
                Ok(subscription)
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                Err(e)
            }
        }
    }

    /// Close the connection
    ///
    /// Idempotent. Returns `true` only for the call that actually removed the
    /// broadcaster subscription.
    pub async fn close(&mut self, reason: CloseReason) -> bool {
        match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Open(id) => {
                info!("live connection {id} closed: {reason}");
                self.broadcaster.unsubscribe(id).await
            }
            ConnectionState::Connecting => false,
            ConnectionState::Closed => false,
        }
    }
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: ApiState) {
    let mut connection = LiveConnection::new(state.broadcaster().clone());

    let mut subscription = match connection.open().await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!("could not register live connection: {:#}", e);
            return;
        }
    };

    info!("WebSocket client connected as {}", subscription.id);

    let (mut sender, mut receiver) = socket.split();

    // Forward published readings to the observer
    let mut send_task = tokio::spawn(async move {
        while let Some(reading) = subscription.recv().await {
            let text = match serde_json::to_string(&reading) {
                Ok(text) => text,
                Err(e) => {
                    warn!("failed to encode reading #{}: {}", reading.id, e);
                    continue;
                }
            };

            if sender.send(Message::Text(text)).await.is_err() {
                debug!("WebSocket send failed, client disconnected");
                return CloseReason::SendFailed;
            }
        }

        let _ = sender.close().await;
        CloseReason::BroadcasterGone
    });

    // Inbound frames carry nothing; pings are answered by axum
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
        CloseReason::ObserverClosed
    });

    // Wait for either task to finish
    let reason = tokio::select! {
        result = (&mut send_task) => {
            recv_task.abort();
            result.unwrap_or(CloseReason::SendFailed)
        }
        result = (&mut recv_task) => {
            send_task.abort();
            result.unwrap_or(CloseReason::ObserverClosed)
        }
    };

    connection.close(reason).await;
}
