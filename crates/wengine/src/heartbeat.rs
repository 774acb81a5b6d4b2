// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat / command channel (C5): one long-lived `RouteCommand` duplex
//! stream for the daemon's lifetime, kept alive by a 30s ping and able to
//! dispatch inbound remote-control commands to a daemon-level handler.
//!
//! Three independently scheduled tasks share the current stream: a
//! reconnector (owns connecting and reconnecting), a ping task, and an
//! inbound dispatch task. The outbound sender lives behind a `parking_lot`
//! `RwLock` so ping and dispatch can both reach it without blocking each
//! other; the inbound `Streaming` handle lives behind a `tokio::sync::Mutex`
//! since reading it awaits. A single-slot `Notify` collapses any number of
//! concurrent reconnect requests into one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wk_adapters::Connection;
use wk_proto::pb::{CommandRequest, CommandResponse, CommandStatusWire};

const PING_INTERVAL: Duration = Duration::from_secs(30);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// The daemon-level hook a command dispatches into — pause/resume and
/// friends, reached through the scheduler.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: &str, data: &HashMap<String, String>) -> CommandStatusWire;
}

struct Outbound {
    tx: mpsc::Sender<CommandResponse>,
}

pub struct Heartbeat {
    connection: Arc<Connection>,
    handler: Arc<dyn CommandHandler>,
    outbound: RwLock<Option<Outbound>>,
    inbound: AsyncMutex<Option<tonic::Streaming<CommandRequest>>>,
    reconnect: Notify,
}

impl Heartbeat {
    pub fn new(connection: Arc<Connection>, handler: Arc<dyn CommandHandler>) -> Arc<Self> {
        Arc::new(Self {
            connection,
            handler,
            outbound: RwLock::new(None),
            inbound: AsyncMutex::new(None),
            reconnect: Notify::new(),
        })
    }

    /// Spawns the reconnector, ping, and dispatch tasks. Returns their join
    /// handles so callers can await clean shutdown.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> Vec<tokio::task::JoinHandle<()>> {
        let reconnector = {
            let this = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { this.reconnect_loop(shutdown).await })
        };
        let pinger = {
            let this = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { this.ping_loop(shutdown).await })
        };
        let dispatcher = {
            let this = self.clone();
            tokio::spawn(async move { this.dispatch_loop(shutdown).await })
        };
        vec![reconnector, pinger, dispatcher]
    }

    async fn connect_once(&self) -> Result<(), wk_adapters::AdapterError> {
        let (tx, rx) = mpsc::channel(16);
        let outbound = ReceiverStream::new(rx);
        let mut client = self.connection.client();
        let response = client.route_command(outbound).await?;
        let inbound = response.into_inner();
        *self.outbound.write() = Some(Outbound { tx });
        *self.inbound.lock().await = Some(inbound);
        info!("command channel connected");
        Ok(())
    }

    async fn reconnect_loop(&self, shutdown: CancellationToken) {
        loop {
            if shutdown.is_cancelled() {
                return;
            }
            if let Err(e) = self.connect_once().await {
                warn!(error = %e, "command channel connect failed, retrying");
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(RECONNECT_BACKOFF) => continue,
                }
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = self.reconnect.notified() => {
                    info!("command channel reconnecting");
                }
            }
        }
    }

    async fn ping_loop(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(PING_INTERVAL);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => self.ping().await,
            }
        }
    }

    async fn ping(&self) {
        let tx = self.outbound.read().as_ref().map(|o| o.tx.clone());
        let Some(tx) = tx else { return };
        if tx.send(CommandResponse::default()).await.is_err() {
            warn!("command channel ping failed, requesting reconnect");
            self.reconnect.notify_one();
        }
    }

    async fn dispatch_loop(&self, shutdown: CancellationToken) {
        loop {
            if shutdown.is_cancelled() {
                return;
            }
            let next = {
                let mut guard = self.inbound.lock().await;
                match guard.as_mut() {
                    Some(stream) => stream.message().await,
                    None => {
                        drop(guard);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        continue;
                    }
                }
            };
            match next {
                Ok(Some(command)) => self.handle_command(command).await,
                Ok(None) => {
                    warn!("command channel closed by server, requesting reconnect");
                    self.reconnect.notify_one();
                    tokio::time::sleep(RECONNECT_BACKOFF).await;
                }
                Err(status) if status.code() == tonic::Code::Unavailable => {
                    warn!("command channel unavailable, requesting reconnect");
                    self.reconnect.notify_one();
                    tokio::time::sleep(RECONNECT_BACKOFF).await;
                }
                Err(status) => {
                    warn!(error = %status, "command channel receive error");
                }
            }
        }
    }

    async fn handle_command(&self, command: CommandRequest) {
        let status = self.handler.handle(&command.command, &command.data).await;
        let reply = build_reply(command, status);
        let tx = self.outbound.read().as_ref().map(|o| o.tx.clone());
        if let Some(tx) = tx {
            let _ = tx.send(reply).await;
        }
    }
}

/// Echoes the command's `id`/`command` back with the handler's status —
/// pulled out of [`Heartbeat::handle_command`] so the reply shape is
/// testable without a live connection.
fn build_reply(command: CommandRequest, status: CommandStatusWire) -> CommandResponse {
    CommandResponse { id: command.id, command: command.command, status: status as i32 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler for CountingHandler {
        async fn handle(&self, _command: &str, _data: &HashMap<String, String>) -> CommandStatusWire {
            self.calls.fetch_add(1, Ordering::SeqCst);
            CommandStatusWire::CommandStatusOk
        }
    }

    #[tokio::test]
    async fn handler_runs_once_and_build_reply_echoes_id_and_command() {
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0) });
        let command =
            CommandRequest { id: "c1".into(), command: "Pause".into(), data: HashMap::new() };

        let status = handler.handle(&command.command, &command.data).await;
        let reply = build_reply(command, status);

        assert_eq!(reply.id, "c1");
        assert_eq!(reply.command, "Pause");
        assert_eq!(reply.status, CommandStatusWire::CommandStatusOk as i32);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn build_reply_carries_the_status_the_handler_returned() {
        let command = CommandRequest { id: "c2".into(), command: "Resume".into(), data: HashMap::new() };
        let reply = build_reply(command, CommandStatusWire::CommandStatusNotImplemented);
        assert_eq!(reply.status, CommandStatusWire::CommandStatusNotImplemented as i32);
    }
}
