use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sensor_relay::{
    SensorPayload,
    actors::device::DeviceHandle,
    config::DeviceConfig,
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(name = "sensor-agent")]
#[command(about = "Simulated sensor board posting readings to a hub", long_about = None)]
struct Args {
    /// Hub URL (defaults to SENSOR_HUB_URL or http://127.0.0.1:8080)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Seconds between readings
    #[arg(short, long, default_value_t = 2)]
    interval: u64,

    /// Send a single reading with this temperature and exit
    #[arg(long)]
    temperature: Option<f64>,

    /// Send a single reading with this distance and exit
    #[arg(long)]
    distance: Option<f64>,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("sensor_relay", LevelFilter::DEBUG),
        ("sensor_agent", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let defaults = DeviceConfig::default();
    let config = DeviceConfig {
        hub_url: args.url.unwrap_or(defaults.hub_url),
        interval: Duration::from_secs(args.interval),
        ..defaults
    };

    let device = DeviceHandle::spawn(config)?;

    if args.temperature.is_some() || args.distance.is_some() {
        let response = device
            .send_now(SensorPayload {
                temperature: args.temperature,
                distance: args.distance,
            })
            .await?;
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down");
    device.shutdown().await?;

    Ok(())
}
