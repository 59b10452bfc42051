pub mod cluster;
pub mod config;
pub mod error;
pub mod http;
pub mod node;
pub mod system;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rcond::NetworkManager;
use rcond::memory::MemoryStore;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::node::{Node, shutdown_signal};
use crate::system::{DryRun, SystemControl, Systemd};
use crate::users::AuthorizedKeys;

#[derive(Parser, Debug)]
#[command(name = "rcond-agent")]
#[command(version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Keep connection profiles in memory and log power and hostname
    /// changes instead of applying them.
    #[arg(long)]
    dry_run: bool,
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    tracing::info!(
        config = %args.config.display(),
        addr = %config.rcond.addr,
        connections = config.network.connections.len(),
        cluster = config.cluster.enabled,
        dry_run = args.dry_run,
        "rcond-agent starting"
    );

    let (network, system): (NetworkManager, Arc<dyn SystemControl>) = if args.dry_run {
        let hostname = if config.hostname.is_empty() {
            "localhost"
        } else {
            config.hostname.as_str()
        };
        (
            NetworkManager::with_connector(MemoryStore::new()),
            Arc::new(DryRun::new(hostname)),
        )
    } else {
        (NetworkManager::new(), Arc::new(Systemd))
    };

    let node = Node::start(&config, network, system, AuthorizedKeys::default()).await;
    node.serve(shutdown_signal()).await?;

    tracing::info!("rcond-agent shut down");
    Ok(())
}
