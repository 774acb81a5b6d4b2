// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: the sequence run once, before the scheduler loop, that
//! either leaves the process ready to serve jobs or fails fast.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use wk_adapters::{Connection, Container, ResourceManager};
use wk_core::ContainerId;
use wk_engine::{Daemon, JobDeps, SchedulerConfig};
use wk_storage::{CredentialStore, HomeLayout};

use crate::env;

/// Everything the binary needs to know to start: resolved once at process
/// start from flags and environment.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub home: PathBuf,
    pub grpc_addr: String,
    pub tls: bool,
    pub hostname: String,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create state directory: {0}")]
    StateDir(#[source] std::io::Error),

    #[error("failed to open credential store: {0}")]
    CredentialStore(#[source] wk_storage::StorageError),

    #[error("failed to connect to the local container runtime: {0}")]
    ContainerRuntime(#[source] bollard::errors::Error),

    #[error("orphan container cleanup failed: {0}")]
    OrphanCleanup(#[source] wk_adapters::AdapterError),

    #[error("handshake with the scheduler failed: {0}")]
    Handshake(#[source] wk_adapters::AdapterError),
}

/// The assembled, not-yet-running daemon plus the channel its scheduler
/// reports job outcomes on.
pub struct Started {
    pub daemon: Arc<Daemon>,
    pub done_rx: tokio::sync::mpsc::UnboundedReceiver<(wk_core::JobId, Result<(), wk_engine::EngineError>)>,
    pub container: Arc<Container>,
}

/// Runs the startup sequence: state directory, credential store, Docker
/// connection, orphan cleanup, handshake, then assembles the [`Daemon`].
///
/// Every step here is fatal on failure — a worker that can't complete one
/// of these has nothing useful to do and should exit non-zero rather than
/// run degraded.
pub async fn startup(config: StartupConfig) -> Result<Started, StartupError> {
    let layout = HomeLayout::new(config.home.clone());
    layout.ensure_dirs().map_err(StartupError::StateDir)?;

    let store = Arc::new(CredentialStore::open(&config.home).map_err(StartupError::CredentialStore)?);
    info!(home = %config.home.display(), "credential store opened");

    let docker = bollard::Docker::connect_with_local_defaults().map_err(StartupError::ContainerRuntime)?;
    let container = Arc::new(Container::new(docker, config.hostname.clone()));

    cleanup_orphans(&container).await.map_err(StartupError::OrphanCleanup)?;

    let connection =
        Arc::new(Connection::connect(config.grpc_addr.clone(), config.tls, store).await.map_err(StartupError::Handshake)?);
    info!(device_id = %connection.device_id(), "scheduler handshake complete");

    let deps = JobDeps {
        connection: connection.clone(),
        resources: Arc::new(ResourceManager::new(reqwest::Client::new())),
        container: container.clone(),
        http: reqwest::Client::new(),
    };

    let work_root = layout.data_root();
    let (daemon, done_rx) = Daemon::new(connection, deps, work_root, config.scheduler);

    Ok(Started { daemon, done_rx, container })
}

/// Removes every container this host left running from a previous
/// instance, identified by the starter label rather than tracked locally.
async fn cleanup_orphans(container: &Container) -> Result<(), wk_adapters::AdapterError> {
    let orphans = container.list_orphans().await?;
    if orphans.is_empty() {
        return Ok(());
    }
    warn!(count = orphans.len(), "removing orphaned containers from a previous run");
    for id in orphans {
        container.remove(&ContainerId::from_string(&id)).await?;
    }
    Ok(())
}

/// Resolves a [`StartupConfig`] from CLI overrides and the environment,
/// with CLI flags taking precedence over `SATH_*` environment variables.
pub fn resolve_config(home: PathBuf, grpc_addr_flag: Option<String>) -> StartupConfig {
    let grpc_addr = grpc_addr_flag
        .or_else(env::grpc_endpoint)
        .unwrap_or_else(|| "http://127.0.0.1:7777".to_string());

    StartupConfig {
        home,
        grpc_addr,
        tls: !env::debug_mode(),
        hostname: env::hostname(),
        scheduler: SchedulerConfig {
            max_concurrent_jobs: env::max_concurrent_jobs(),
            fetch_interval: env::fetch_interval(),
        },
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
