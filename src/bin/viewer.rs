//! Observer dashboard
//!
//! Prints the current values, the recent history and the time-series
//! summary of a hub's readings whenever they change. Logs go to a file so
//! stdout only carries the views.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use sensor_relay::viewer::{Config, Dashboard};

#[derive(Parser, Debug)]
#[command(name = "sensor-viewer")]
#[command(about = "Plain-text dashboard for live sensor readings", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Hub URL (overrides config file)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,
}

fn init_logging(level: tracing::Level) {
    let log_dir = dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("sensor-relay");

    std::fs::create_dir_all(&log_dir).ok();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("viewer.log"));

    match log_file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_ansi(false)
                .with_max_level(level)
                .with_writer(file)
                .init();
        }
        Err(_) => {
            // If we can't create a log file, use a minimal stderr logger that only shows errors
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .with_max_level(tracing::Level::ERROR)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    init_logging(config.log_level());

    let config = Config {
        api_url: args.url.unwrap_or(config.api_url),
        ..config
    };

    Dashboard::new(config)?.run().await
}
