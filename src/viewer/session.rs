//! One observer's live connection, shared by all of its views
//!
//! An `ObserverSession` owns exactly one live connection. A single pump task
//! reads it and hands every reading, in order, to each attached [`ViewFeed`].
//! Views attach and detach independently. Clones of the session share the
//! connection, which is torn down when the last clone is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Reading;

use super::websocket::{LiveClient, LiveEvent};

/// A reading as seen by an observer
#[derive(Debug, Clone, PartialEq)]
pub struct LiveMessage {
    pub reading: Reading,

    /// When this observer received it
    pub received_at: DateTime<Utc>,
}

struct Fanout {
    observers: Mutex<HashMap<u64, mpsc::UnboundedSender<LiveMessage>>>,
    next_observer: AtomicU64,
    latest: watch::Sender<Option<LiveMessage>>,
    connected: watch::Sender<bool>,
}

impl Fanout {
    fn new() -> Self {
        Self {
            observers: Mutex::new(HashMap::new()),
            next_observer: AtomicU64::new(1),
            latest: watch::channel(None).0,
            connected: watch::channel(false).0,
        }
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<LiveMessage>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(&self) -> (u64, mpsc::UnboundedReceiver<LiveMessage>) {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers().insert(id, tx);
        (id, rx)
    }

    fn detach(&self, id: u64) {
        if self.observers().remove(&id).is_some() {
            debug!("view #{id} detached");
        }
    }

    fn deliver(&self, message: LiveMessage) {
        self.latest.send_replace(Some(message.clone()));
        self.observers()
            .retain(|_, tx| tx.send(message.clone()).is_ok());
    }

    fn close(&self) {
        self.observers().clear();
        self.connected.send_replace(false);
    }
}

/// Dropped together with the last session clone
struct Connection {
    pump: JoinHandle<()>,
    fanout: Arc<Fanout>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("closing live connection");
        self.pump.abort();
        self.fanout.close();
    }
}

/// Shared live connection of one observer
#[derive(Clone)]
pub struct ObserverSession {
    fanout: Arc<Fanout>,
    _connection: Arc<Connection>,
}

impl ObserverSession {
    /// Open the session's live connection to the hub at `api_url`
    ///
    /// Must be called inside a Tokio runtime.
    pub fn connect(api_url: &str) -> Self {
        Self::from_stream(LiveClient::new(api_url).events())
    }

    /// Build a session over any source of live events
    pub fn from_stream<S>(events: S) -> Self
    where
        S: Stream<Item = LiveEvent> + Send + 'static,
    {
        let fanout = Arc::new(Fanout::new());
        let pump = tokio::spawn(pump(events, fanout.clone()));

        Self {
            fanout: fanout.clone(),
            _connection: Arc::new(Connection { pump, fanout }),
        }
    }

    /// Attach a new view
    ///
    /// The feed receives every reading that arrives after this call.
    pub fn subscribe(&self) -> ViewFeed {
        let (id, receiver) = self.fanout.attach();
        debug!("view #{id} attached");

        ViewFeed {
            id,
            receiver,
            fanout: self.fanout.clone(),
        }
    }

    /// The most recent message, `None` until the first one arrives
    pub fn latest(&self) -> watch::Receiver<Option<LiveMessage>> {
        self.fanout.latest.subscribe()
    }

    /// Whether the live connection is currently open
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.fanout.connected.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.fanout.observers().len()
    }
}

/// One view's in-order copy of the live stream
///
/// Dropping the feed detaches the view.
pub struct ViewFeed {
    id: u64,
    receiver: mpsc::UnboundedReceiver<LiveMessage>,
    fanout: Arc<Fanout>,
}

impl ViewFeed {
    /// Next message; `None` once the session is closed
    pub async fn recv(&mut self) -> Option<LiveMessage> {
        self.receiver.recv().await
    }
}

impl Drop for ViewFeed {
    fn drop(&mut self) {
        self.fanout.detach(self.id);
    }
}

async fn pump<S>(events: S, fanout: Arc<Fanout>)
where
    S: Stream<Item = LiveEvent>,
{
    let mut events = std::pin::pin!(events);

    while let Some(event) = events.next().await {
        match event {
            LiveEvent::Connected => {
                info!("live connection open");
                fanout.connected.send_replace(true);
            }
            LiveEvent::Reading(reading) => {
                fanout.deliver(LiveMessage {
                    reading,
                    received_at: Utc::now(),
                });
            }
            LiveEvent::Disconnected(reason) => {
                warn!("live connection lost: {reason}");
                fanout.connected.send_replace(false);
            }
        }
    }

    fanout.connected.send_replace(false);
}
