//! WebSocket client for real-time reading streaming
//!
//! One connection attempt per client; a lost connection is reported once and
//! the stream ends. Readings sent while disconnected are not recovered.

use futures::{Stream, StreamExt, stream};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::Reading;

/// What the live connection reports
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Connected,
    Reading(Reading),
    Disconnected(String),
}

enum Phase {
    Connecting(String),
    Open(WebSocketStream<MaybeTlsStream<TcpStream>>),
    Done,
}

/// WebSocket client for the hub's `/ws` endpoint
pub struct LiveClient {
    url: String,
}

impl LiveClient {
    pub fn new(api_url: &str) -> Self {
        // Convert http:// to ws:// and https:// to wss://
        let ws_url = api_url
            .trim_end_matches('/')
            .replace("https://", "wss://")
            .replace("http://", "ws://");

        Self {
            url: format!("{}/ws", ws_url),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and stream events
    ///
    /// Yields `Connected` once the handshake succeeds, then one `Reading` per
    /// text frame, and finally a single `Disconnected`. Dropping the stream
    /// closes the socket.
    pub fn events(self) -> impl Stream<Item = LiveEvent> + Send + 'static {
        stream::unfold(Phase::Connecting(self.url), |phase| async move {
            match phase {
                Phase::Connecting(url) => {
                    info!("connecting to WebSocket: {}", url);
                    match connect_async(url.as_str()).await {
                        Ok((socket, _)) => {
                            info!("WebSocket connected");
                            Some((LiveEvent::Connected, Phase::Open(socket)))
                        }
                        Err(e) => Some((
                            LiveEvent::Disconnected(format!("failed to connect to {url}: {e}")),
                            Phase::Done,
                        )),
                    }
                }
                Phase::Open(socket) => next_event(socket).await,
                Phase::Done => None,
            }
        })
    }
}

async fn next_event(
    mut socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
) -> Option<(LiveEvent, Phase)> {
    loop {
        let event = match socket.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<Reading>(&text) {
                Ok(reading) => return Some((LiveEvent::Reading(reading), Phase::Open(socket))),
                Err(e) => {
                    warn!("failed to parse reading: {}\nRaw JSON: {}", e, text);
                    continue;
                }
            },
            Some(Ok(Message::Close(_))) => {
                LiveEvent::Disconnected("connection closed by server".to_string())
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => LiveEvent::Disconnected(format!("WebSocket error: {e}")),
            None => LiveEvent::Disconnected("connection lost".to_string()),
        };

        debug!("live stream ended: {:?}", event);
        return Some((event, Phase::Done));
    }
}
