// src/main.rs

//! The main entry point for the replwarden daemon.

use std::sync::Arc;

use clap::Parser;
use replwarden::config::Config;
use replwarden::core::api;
use replwarden::core::counter::SharedCounter;
use replwarden::core::membership::ChitchatMembership;
use replwarden::daemon::Daemon;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

/// Gossip-elected daemon that reconciles Kafka replication blacklists
/// against ZooKeeper state.
#[derive(Parser, Debug)]
#[command(name = "replwarden")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "./config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("unable to read config: {err}");
            std::process::exit(1);
        }
    };

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().compact().with_ansi(true))
        .init();

    info!(config = %cli.config, "starting replwarden");

    let local_name = format!("{}-{}", config.monitor.bind_addr, uuid::Uuid::new_v4());
    let cluster = match ChitchatMembership::create(
        &config.monitor.bind_addr,
        config.monitor.bind_port,
        &local_name,
        &config.monitor.peers,
    )
    .await
    {
        Ok(c) => Arc::new(c),
        Err(err) => {
            error!(error = %err, "error building cluster");
            std::process::exit(1);
        }
    };

    let counter = Arc::new(SharedCounter::new());

    let (shutdown_tx, _) = broadcast::channel(1);

    let api_shutdown_rx = shutdown_tx.subscribe();
    let api_bind_addr = config.monitor.bind_addr.clone();
    let api_port = config.monitor.api_port.clone();
    let api_counter = counter.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(err) = api::run(&api_bind_addr, &api_port, api_counter, api_shutdown_rx).await {
            error!(error = %err, "api failure");
            std::process::exit(1);
        }
    });

    let daemon = Arc::new(Daemon::new(config, cluster, counter));
    let daemon_shutdown_rx = shutdown_tx.subscribe();
    let daemon_handle = tokio::spawn(daemon.run(daemon_shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("received shutdown signal");
    let _ = shutdown_tx.send(());

    let _ = daemon_handle.await;
    api_handle.abort();

    Ok(())
}
