//! Main application logic
//!
//! Opens one observer session, attaches the three views, seeds the ring and
//! the series with one snapshot request each, and prints a plain-text
//! summary whenever any of them changes.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::Reading;

use super::{
    client::{SnapshotClient, SnapshotError},
    config::Config,
    session::ObserverSession,
    views::{CurrentMetrics, HistoryRing, Point, SeedState, TimeSeries},
};

type SeedTask = JoinHandle<Result<Vec<Reading>, SnapshotError>>;

/// Plain-text observer dashboard
pub struct Dashboard {
    config: Config,
    session: ObserverSession,
    snapshots: SnapshotClient,
}

impl Dashboard {
    /// Create a new dashboard and open its live connection
    pub fn new(config: Config) -> Result<Self> {
        let snapshots = SnapshotClient::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout),
        )?;
        let session = ObserverSession::connect(&config.api_url);

        Ok(Self {
            config,
            session,
            snapshots,
        })
    }

    fn spawn_seed(&self, count: usize) -> SeedTask {
        let snapshots = self.snapshots.clone();
        tokio::spawn(async move { snapshots.latest(count).await })
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let mut metrics_feed = self.session.subscribe();
        let mut history_feed = self.session.subscribe();
        let mut series_feed = self.session.subscribe();
        let mut connected = self.session.connected();

        let mut metrics = CurrentMetrics::default();
        let mut history = HistoryRing::new(self.config.history_size);
        let mut series = TimeSeries::new();

        let mut history_seed = self.spawn_seed(self.config.history_size);
        let mut series_seed = self.spawn_seed(self.config.series_seed);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        info!("dashboard started for {}", self.config.api_url);

        loop {
            tokio::select! {
                Some(message) = metrics_feed.recv() => {
                    metrics = metrics.reduce(&message);
                }

                Some(message) = history_feed.recv() => {
                    history = history.reduce(&message);
                }

                Some(message) = series_feed.recv() => {
                    series = series.reduce(&message);
                }

                result = &mut history_seed, if history.seed_state().is_pending() => {
                    history = history.seed(flatten(result));
                    debug!("history seed: {:?}", history.seed_state());
                }

                result = &mut series_seed, if series.seed_state().is_pending() => {
                    series = series.seed(flatten(result));
                    debug!("series seed: {:?}", series.seed_state());
                }

                Ok(()) = connected.changed() => {}

                _ = &mut ctrl_c => {
                    info!("received Ctrl-C, shutting down");
                    break;
                }
            }

            let is_connected = *connected.borrow_and_update();
            println!("{}", render(&metrics, &history, &series, is_connected));
        }

        Ok(())
    }
}

fn flatten(
    result: Result<Result<Vec<Reading>, SnapshotError>, tokio::task::JoinError>,
) -> Result<Vec<Reading>, SnapshotError> {
    result.unwrap_or_else(|e| Err(SnapshotError::Transport(e.to_string())))
}

fn seed_label(state: &SeedState) -> String {
    match state {
        SeedState::Pending => "loading".to_string(),
        SeedState::Loaded => "loaded".to_string(),
        SeedState::Failed(reason) => format!("failed ({reason})"),
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn last_point(points: &[Point]) -> String {
    points
        .last()
        .map_or_else(|| "-".to_string(), |p| format!("{:.1} @ {}", p.value, p.at.format("%H:%M:%S")))
}

/// Plain-text summary of the three views
pub fn render(
    metrics: &CurrentMetrics,
    history: &HistoryRing,
    series: &TimeSeries,
    connected: bool,
) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "== {} [{}] ==",
        Utc::now().format("%H:%M:%S"),
        if connected { "live" } else { "disconnected" }
    );

    let _ = writeln!(
        out,
        "temperature: {} ({})",
        or_dash(metrics.temperature.map(|g| g.value)),
        or_dash(metrics.temperature.and_then(|g| g.status)),
    );
    let _ = writeln!(
        out,
        "distance:    {} ({})",
        or_dash(metrics.distance.map(|g| g.value)),
        or_dash(metrics.distance.and_then(|g| g.status)),
    );

    let _ = writeln!(
        out,
        "history ({}/{}, {}):",
        history.entries().len(),
        history.capacity(),
        seed_label(history.seed_state())
    );
    for reading in history.entries() {
        let _ = writeln!(
            out,
            "  #{:<6} {}  temp={} ({})  dist={} ({})",
            reading.id,
            reading.created_at.format("%H:%M:%S"),
            or_dash(reading.temperature),
            or_dash(reading.temperature_status),
            or_dash(reading.distance),
            or_dash(reading.distance_status),
        );
    }

    let _ = writeln!(
        out,
        "series ({}): temperature {} points, last {} | distance {} points, last {}",
        seed_label(series.seed_state()),
        series.temperature().len(),
        last_point(series.temperature()),
        series.distance().len(),
        last_point(series.distance()),
    );

    out
}
