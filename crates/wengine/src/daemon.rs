// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon façade (C9): the one type a binary entrypoint talks to. Wires the
//! connection, the command channel, and the scheduler together and is
//! itself the [`CommandHandler`] the command channel dispatches into.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use wk_adapters::Connection;
use wk_core::User;
use wk_proto::pb::CommandStatusWire;

use crate::error::EngineError;
use crate::heartbeat::{CommandHandler, Heartbeat};
use crate::job::JobDeps;
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerStatus};

pub struct Daemon {
    connection: Arc<Connection>,
    heartbeat: Arc<Heartbeat>,
    scheduler: Arc<Scheduler>,
}

impl Daemon {
    /// Assembles the façade from already-connected collaborators; the
    /// caller (the `wk-daemon` binary's startup path) owns handshake and
    /// credential-store setup since those can fail the whole process.
    pub fn new(
        connection: Arc<Connection>,
        deps: JobDeps,
        work_root: PathBuf,
        config: SchedulerConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<(wk_core::JobId, Result<(), EngineError>)>) {
        let (scheduler, done_rx) = Scheduler::new(deps, work_root, config);
        let daemon = Arc::new_cyclic(move |weak: &std::sync::Weak<Self>| {
            let handler: Arc<dyn CommandHandler> = Arc::new(DaemonHandler { daemon: weak.clone() });
            Self { connection: connection.clone(), heartbeat: Heartbeat::new(connection, handler), scheduler }
        });
        (daemon, done_rx)
    }

    /// Spawns the scheduler loop and the heartbeat's three tasks. Returns
    /// every join handle so the binary can await clean shutdown.
    pub fn spawn(
        self: &Arc<Self>,
        done_rx: mpsc::UnboundedReceiver<(wk_core::JobId, Result<(), EngineError>)>,
        shutdown: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = self.heartbeat.spawn(shutdown.clone());
        let scheduler = self.scheduler.clone();
        handles.push(tokio::spawn(async move { scheduler.run(done_rx, shutdown).await }));
        handles
    }

    pub async fn start(&self) -> Result<(), EngineError> {
        self.scheduler.start().await
    }

    pub async fn pause(&self) -> Result<(), EngineError> {
        self.scheduler.pause().await
    }

    pub async fn resume(&self) -> Result<(), EngineError> {
        self.scheduler.resume().await
    }

    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    pub fn current_user(&self) -> Option<User> {
        self.connection.current_user()
    }

    pub async fn login(&self, account: &str, password: &str) -> Result<User, EngineError> {
        Ok(self.connection.login(account, password).await?)
    }

    pub fn logout(&self) -> Result<(), EngineError> {
        Ok(self.connection.logout()?)
    }
}

/// Adapts [`Daemon`] to [`CommandHandler`] through a weak reference, since
/// the [`Heartbeat`] the handler is registered with is itself owned by the
/// [`Daemon`] it dispatches into.
struct DaemonHandler {
    daemon: std::sync::Weak<Daemon>,
}

#[async_trait]
impl CommandHandler for DaemonHandler {
    async fn handle(&self, command: &str, _data: &HashMap<String, String>) -> CommandStatusWire {
        let Some(daemon) = self.daemon.upgrade() else {
            return CommandStatusWire::CommandStatusInvalidState;
        };
        match command {
            "Pause" => match daemon.pause().await {
                Ok(()) => CommandStatusWire::CommandStatusOk,
                Err(EngineError::ActionBusy) => CommandStatusWire::CommandStatusInvalidState,
                Err(e) => {
                    warn!(error = %e, "Pause command failed");
                    CommandStatusWire::CommandStatusInvalidState
                }
            },
            "Resume" => match daemon.resume().await {
                Ok(()) => CommandStatusWire::CommandStatusOk,
                Err(EngineError::ActionBusy) => CommandStatusWire::CommandStatusInvalidState,
                Err(e) => {
                    warn!(error = %e, "Resume command failed");
                    CommandStatusWire::CommandStatusInvalidState
                }
            },
            "Start" => match daemon.start().await {
                Ok(()) => CommandStatusWire::CommandStatusOk,
                Err(EngineError::ActionBusy) => CommandStatusWire::CommandStatusInvalidState,
                Err(e) => {
                    warn!(error = %e, "Start command failed");
                    CommandStatusWire::CommandStatusInvalidState
                }
            },
            _ => CommandStatusWire::CommandStatusNotImplemented,
        }
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
