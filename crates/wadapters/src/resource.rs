// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource Manager (C4): maps `destPath -> Downloader`, deduplicating
//! concurrent requests for the same destination and guaranteeing readers
//! never observe a partial file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::error::AdapterError;

/// Progress snapshot for a single in-flight or completed download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub total: Option<u64>,
    pub current: u64,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => (self.current as f64 / total as f64).min(1.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    InProgress,
    Done,
    Failed(String),
}

/// A shared, cancelable download from `url` into `dest`.
///
/// All observers of the same `destPath` see the same [`Downloader`]
/// instance and therefore the same bytes and the same completion.
pub struct Downloader {
    progress_rx: watch::Receiver<Progress>,
    outcome_rx: watch::Receiver<Outcome>,
    cancel: CancellationToken,
}

impl Downloader {
    fn spawn(client: reqwest::Client, url: String, dest: PathBuf) -> Arc<Self> {
        let (progress_tx, progress_rx) = watch::channel(Progress { total: None, current: 0 });
        let (outcome_tx, outcome_rx) = watch::channel(Outcome::InProgress);
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let result = run_download(&client, &url, &dest, &progress_tx, &task_cancel).await;
            let outcome = match result {
                Ok(()) => Outcome::Done,
                Err(e) => {
                    warn!(url, error = %e, "resource download failed");
                    Outcome::Failed(e.to_string())
                }
            };
            let _ = outcome_tx.send(outcome);
        });

        Arc::new(Self { progress_rx, outcome_rx, cancel })
    }

    pub fn total(&self) -> Option<u64> {
        self.progress_rx.borrow().total
    }

    pub fn current(&self) -> u64 {
        self.progress_rx.borrow().current
    }

    pub fn progress(&self) -> f64 {
        self.progress_rx.borrow().fraction()
    }

    /// Resolves once the download reaches a terminal outcome; `Ok(())` on
    /// success, `Err` with the failure reason otherwise.
    pub async fn done(&self) -> Result<(), AdapterError> {
        let mut rx = self.outcome_rx.clone();
        loop {
            match &*rx.borrow() {
                Outcome::Done => return Ok(()),
                Outcome::Failed(reason) => {
                    return Err(AdapterError::Download { url: String::new(), reason: reason.clone() })
                }
                Outcome::InProgress => {}
            }
            if rx.changed().await.is_err() {
                return Err(AdapterError::Download {
                    url: String::new(),
                    reason: "downloader dropped".into(),
                });
            }
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

async fn run_download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress_tx: &watch::Sender<Progress>,
    cancel: &CancellationToken,
) -> Result<(), AdapterError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await?.error_for_status()?;
    let total = response.content_length();
    let tmp_path = tmp_path_for(dest);
    let mut file = tokio::fs::File::create(&tmp_path).await?;

    let mut stream = response.bytes_stream();
    let mut current = 0u64;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                return Err(AdapterError::Download {
                    url: url.to_string(),
                    reason: "canceled".into(),
                });
            }
            chunk = stream.next() => chunk,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        current += chunk.len() as u64;
        let _ = progress_tx.send(Progress { total, current });
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest).await?;
    let _ = progress_tx.send(Progress { total: total.or(Some(current)), current });
    Ok(())
}

fn tmp_path_for(dest: &Path) -> PathBuf {
    let mut os = dest.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Keyed by destination path; evicts completed entries lazily on next
/// lookup rather than eagerly ("may be garbage-collected" is left
/// unspecified, and lazy eviction is the simpler choice).
#[derive(Clone)]
pub struct ResourceManager {
    client: reqwest::Client,
    active: Arc<Mutex<HashMap<PathBuf, Arc<Downloader>>>>,
}

impl ResourceManager {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, active: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Returns the shared [`Downloader`] for `dest`, starting a new one if
    /// none is active (P4: at most one HTTP GET per destination in flight).
    #[instrument(skip(self, url))]
    pub fn fetch(&self, url: impl Into<String>, dest: impl Into<PathBuf>) -> Arc<Downloader> {
        let dest = dest.into();
        let mut active = self.active.lock();
        if let Some(existing) = active.get(&dest) {
            return existing.clone();
        }
        let downloader = Downloader::spawn(self.client.clone(), url.into(), dest.clone());
        active.insert(dest, downloader.clone());
        downloader
    }

    /// Drops any completed downloaders from the dedup map.
    pub fn gc(&self) {
        let mut active = self.active.lock();
        active.retain(|_, d| matches!(*d.outcome_rx.borrow(), Outcome::InProgress));
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
