//! DeviceActor - Posts sensor readings to the hub
//!
//! Stands in for a physical sensor board. On every tick it takes the next
//! payload from a [`Sweep`] and POSTs it to the hub's `/data` endpoint.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → Sweep::next → POST /data → log alert signal
//!     ↑
//!     └─── Commands (SendNow, Shutdown)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{SensorPayload, config::DeviceConfig, service::IngestResponse};

use super::messages::DeviceCommand;

const TEMPERATURES: [f64; 6] = [25.0, 40.0, 55.5, 70.0, 82.3, 38.0];
const DISTANCES: [f64; 5] = [30.0, 50.0, 75.0, 100.0, 160.0];

/// Deterministic payload generator
///
/// Walks both metrics through every classification band, including the band
/// edges. The two value tables have coprime lengths so that every
/// temperature meets every distance. Every fourth payload carries only one
/// of the two metrics.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    step: usize,
}

impl Iterator for Sweep {
    type Item = SensorPayload;

    fn next(&mut self) -> Option<SensorPayload> {
        let step = self.step;
        self.step = self.step.wrapping_add(1);

        let temperature = TEMPERATURES[step % TEMPERATURES.len()];
        let distance = DISTANCES[step % DISTANCES.len()];

        let payload = match step % 8 {
            3 => SensorPayload {
                temperature: Some(temperature),
                distance: None,
            },
            7 => SensorPayload {
                temperature: None,
                distance: Some(distance),
            },
            _ => SensorPayload {
                temperature: Some(temperature),
                distance: Some(distance),
            },
        };

        Some(payload)
    }
}

/// Actor that periodically posts readings to a hub
pub struct DeviceActor {
    config: DeviceConfig,

    /// HTTP client (reused across requests)
    client: reqwest::Client,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<DeviceCommand>,

    sweep: Sweep,
}

impl DeviceActor {
    /// Create a new device actor
    pub fn new(config: DeviceConfig, command_rx: mpsc::Receiver<DeviceCommand>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            config,
            client,
            command_rx,
            sweep: Sweep::default(),
        })
    }

    /// Run the actor's main loop
    ///
    /// The first automatic send happens one interval after start. Runs until
    /// a Shutdown command is received or the command channel is closed.
    #[instrument(skip(self), fields(hub = %self.config.hub_url))]
    pub async fn run(mut self) {
        debug!("starting device actor");

        let mut ticker = interval(self.config.interval.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let payload = self.sweep.next().unwrap_or_default();
                    if let Err(e) = self.send(payload).await {
                        error!("failed to send reading: {:#}", e);
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        DeviceCommand::SendNow { payload, respond_to } => {
                            debug!("received SendNow command");
                            let result = self.send(payload).await;
                            let _ = respond_to.send(result);
                        }

                        DeviceCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("device actor stopped");
    }

    /// Post one payload to the hub
    ///
    /// The hub answers failures with a JSON body too, so any response that
    /// parses is returned as-is and only transport or decoding problems are
    /// errors.
    async fn send(&self, payload: SensorPayload) -> Result<IngestResponse> {
        let url = format!("{}/data", self.config.hub_url.trim_end_matches('/'));

        trace!("posting {payload:?} to {url}");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("failed to send HTTP request")?;

        let status = response.status();
        let body: IngestResponse = response
            .json()
            .await
            .with_context(|| format!("failed to parse hub response (HTTP {status})"))?;

        match (&body.alert, &body.error) {
            (Some(true), _) => warn!(
                "alert raised for temperature={:?} distance={:?}",
                payload.temperature, payload.distance
            ),
            (_, Some(error)) => warn!("hub rejected reading: {error}"),
            _ => info!(
                "reading accepted: temperature={:?} distance={:?}",
                payload.temperature, payload.distance
            ),
        }

        Ok(body)
    }
}

/// Handle for controlling a DeviceActor
#[derive(Clone)]
pub struct DeviceHandle {
    sender: mpsc::Sender<DeviceCommand>,
}

impl DeviceHandle {
    /// Spawn a new device actor
    pub fn spawn(config: DeviceConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = DeviceActor::new(config, cmd_rx)?;
        tokio::spawn(actor.run());

        Ok(Self { sender: cmd_tx })
    }

    /// Post a payload immediately and return the hub's reply
    pub async fn send_now(&self, payload: SensorPayload) -> Result<IngestResponse> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DeviceCommand::SendNow {
                payload,
                respond_to: tx,
            })
            .await
            .context("failed to send SendNow command")?;

        rx.await.context("failed to receive response")?
    }

    /// Gracefully shut down the device
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(DeviceCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
