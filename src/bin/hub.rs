use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sensor_relay::{
    actors::broadcaster::BroadcasterHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, StorageConfig, read_config_file},
    service::ReadingService,
    storage::{MemoryBackend, ReadingStore},
};
use std::net::SocketAddr;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(name = "sensor-hub")]
#[command(about = "Ingests sensor readings and streams them to live observers", long_about = None)]
struct Args {
    /// Config file (JSON)
    #[arg(short)]
    file: Option<String>,

    /// Bind address (overrides config file and environment)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Keep readings in memory only
    #[arg(long)]
    memory: bool,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("sensor_relay", LevelFilter::DEBUG),
        ("sensor_hub", LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
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

async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ReadingStore>> {
    match config {
        StorageConfig::Memory => {
            info!("using in-memory storage");
            Ok(Arc::new(MemoryBackend::new()))
        }

        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            let backend = sensor_relay::storage::sqlite::SqliteBackend::new(path)
                .await
                .with_context(|| format!("failed to open database {}", path.display()))?;
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("this binary was compiled without SQLite support")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.memory {
        config.storage = StorageConfig::Memory;
    }

    let store = open_store(&config.storage).await?;
    let broadcaster = BroadcasterHandle::spawn(config.subscriber_buffer);
    let service = Arc::new(ReadingService::new(store.clone(), broadcaster.clone()));

    let api_config = ApiConfig {
        bind_addr: config.bind_addr,
        enable_cors: config.enable_cors,
    };
    let addr = spawn_api_server(api_config, ApiState::new(service))
        .await
        .context("failed to start API server")?;

    info!("hub ready on {addr}");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down");
    broadcaster.shutdown().await.ok();
    store.close().await?;

    Ok(())
}
