// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sathd`: the worker daemon binary. Resolves configuration from flags and
//! environment, runs the startup sequence, then drives the scheduler and
//! heartbeat until a shutdown signal arrives.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wk_core::ContainerId;
use wk_daemon::lifecycle::{resolve_config, startup};

/// The worker daemon: leases jobs from the remote scheduler and runs them
/// in containers.
#[derive(Debug, Parser)]
#[command(name = "sathd", version, about)]
struct Cli {
    /// Directory holding the credential store and per-job work directories.
    #[arg(long, default_value = "/var/lib/sath")]
    home: PathBuf,

    /// Scheduler RPC endpoint. Overrides `SATH_GRPC` when given.
    #[arg(long)]
    grpc: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = resolve_config(cli.home, cli.grpc).context("resolving startup configuration")?;
    info!(grpc_addr = %config.grpc_addr, hostname = %config.hostname, "starting worker daemon");

    let started = startup(config).await.context("daemon startup failed")?;
    let wk_daemon::Started { daemon, done_rx, container } = started;

    daemon.start().await.context("starting scheduler")?;

    let shutdown = CancellationToken::new();
    let handles = daemon.spawn(done_rx, shutdown.clone());

    wait_for_shutdown_signal().await?;
    info!("shutdown signal received, draining");
    shutdown.cancel();

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "daemon task panicked during shutdown");
        }
    }

    teardown_containers(&container).await;
    info!("worker daemon stopped");
    Ok(())
}

fn init_tracing() {
    let default_filter = if wk_daemon::env::debug_mode() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}

async fn wait_for_shutdown_signal() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).context("registering SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("registering SIGTERM handler")?;
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Stops and removes every orphan container this instance started, so a
/// clean shutdown never leaves containers running with no scheduler to
/// manage them.
async fn teardown_containers(container: &wk_adapters::Container) {
    match container.list_orphans().await {
        Ok(ids) => {
            for id in ids {
                let container_id = ContainerId::from_string(&id);
                if let Err(e) = container.stop(&container_id).await {
                    error!(container_id = %id, error = %e, "failed to stop container during shutdown");
                }
                if let Err(e) = container.remove(&container_id).await {
                    error!(container_id = %id, error = %e, "failed to remove container during shutdown");
                }
            }
        }
        Err(e) => error!(error = %e, "failed to list containers during shutdown teardown"),
    }
}
