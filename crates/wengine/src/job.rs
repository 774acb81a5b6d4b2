// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job (C7): the per-lease state machine. Drives the three-phase pipeline
//! (Preprocess / Run / Postprocess) over its own `NotifyExecStatus` stream,
//! calling out to the shared collaborators in [`JobDeps`] for every
//! blocking step.
//!
//! Each public phase method corresponds to one "unit of work" the scheduler
//! hands the job and resumes it for later — preprocess runs to completion
//! on its own, `prepare_container`/`execute` need a container the scheduler
//! has attached, and `postprocess` runs once the command has exited.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use wk_adapters::{Connection, Container, ExecOutput, PullProgress, ResourceManager};
use wk_core::{
    ContainerId, ContainerRecord, FileRef, JobId, JobMetadata, JobRecord, JobState, OutputResult,
    OutputStatus, WorkerError, MAX_INLINE_OUTPUT_BYTES,
};
use wk_proto::pb::{ExecNotificationRequest, ExecNotificationResponse, OutputResultWire};
use wk_proto::EngineClient;

use crate::error::EngineError;

/// Services shared across every job the scheduler is driving concurrently.
#[derive(Clone)]
pub struct JobDeps {
    pub connection: Arc<Connection>,
    pub resources: Arc<ResourceManager>,
    pub container: Arc<Container>,
    pub http: reqwest::Client,
}

/// Owns the one `NotifyExecStatus` stream a Job keeps open from creation to
/// its terminal notification. Send failures are retried by reopening the
/// stream up to a bounded number of times before giving up.
pub struct NotificationChannel {
    connection: Arc<Connection>,
    job_id: JobId,
    inner: AsyncMutex<ChannelState>,
}

struct ChannelState {
    tx: Option<mpsc::Sender<ExecNotificationRequest>>,
    call: Option<tokio::task::JoinHandle<Result<tonic::Response<ExecNotificationResponse>, tonic::Status>>>,
    retries: u32,
}

const MAX_NOTIFY_RETRIES: u32 = 3;

impl NotificationChannel {
    /// Constructs the channel without dialing yet; the stream is opened
    /// lazily on the first `send`, since opening is itself async and a Job
    /// must be constructible synchronously.
    pub fn open(connection: Arc<Connection>, job_id: JobId) -> Arc<Self> {
        Arc::new(Self {
            connection,
            job_id,
            inner: AsyncMutex::new(ChannelState { tx: None, call: None, retries: 0 }),
        })
    }

    async fn ensure_open(&self, state: &mut ChannelState) -> Result<(), EngineError> {
        if state.tx.is_some() {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel::<ExecNotificationRequest>(32);
        let mut client: EngineClient<_> = self.connection.client_for_job(self.job_id);
        let outbound = ReceiverStream::new(rx);
        let call = tokio::spawn(async move { client.notify_exec_status(outbound).await });
        state.tx = Some(tx);
        state.call = Some(call);
        Ok(())
    }

    /// Sends one notification, transparently reopening the stream (up to
    /// [`MAX_NOTIFY_RETRIES`] times) on a transient send failure.
    pub async fn send(&self, notification: ExecNotificationRequest) -> Result<(), EngineError> {
        let mut state = self.inner.lock().await;
        self.ensure_open(&mut state).await?;
        loop {
            let Some(tx) = state.tx.clone() else {
                return Err(EngineError::NotificationStreamClosed);
            };
            match tx.send(notification.clone()).await {
                Ok(()) => return Ok(()),
                Err(_) if state.retries < MAX_NOTIFY_RETRIES => {
                    warn!(job_id = %self.job_id, "notification stream EOF, reopening");
                    state.retries += 1;
                    state.tx = None;
                    state.call = None;
                    self.ensure_open(&mut state).await?;
                }
                Err(_) => return Err(EngineError::NotificationStreamClosed),
            }
        }
    }

    /// Ends the outbound stream and awaits exactly one `CloseAndRecv`-style
    /// completion.
    pub async fn close(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock().await;
        state.tx = None;
        if let Some(call) = state.call.take() {
            match call.await {
                Ok(Ok(_)) => {}
                Ok(Err(status)) => warn!(job_id = %self.job_id, error = %status, "notification stream closed with error"),
                Err(e) => warn!(job_id = %self.job_id, error = %e, "notification task panicked"),
            }
        }
        Ok(())
    }
}

/// Drives one lease through its pipeline. Lives as long as the Job does;
/// the scheduler owns it in its `pendingJobs`/running set and resumes the
/// next phase whenever a unit of work completes.
pub struct JobEngine {
    pub record: JobRecord,
    notify: Arc<NotificationChannel>,
}

impl JobEngine {
    pub fn new(connection: Arc<Connection>, lease: JobMetadata, work_dir: PathBuf) -> Self {
        let job_id = lease.job_id;
        let record = JobRecord::new(lease, work_dir);
        Self { record, notify: NotificationChannel::open(connection, job_id) }
    }

    fn flag_bits(&self) -> u32 {
        if self.record.is_paused() {
            0b10
        } else {
            0
        }
    }

    async fn notify_state(&self) -> Result<(), EngineError> {
        self.notify
            .send(ExecNotificationRequest {
                state: self.record.state.to_string(),
                id: String::new(),
                message: String::new(),
                current: 0,
                total: 0,
                flag: self.flag_bits(),
                outputs: Vec::new(),
            })
            .await
    }

    async fn notify_line(&self, message: String) -> Result<(), EngineError> {
        self.notify
            .send(ExecNotificationRequest {
                state: self.record.state.to_string(),
                id: String::new(),
                message,
                current: 0,
                total: 0,
                flag: self.flag_bits(),
                outputs: Vec::new(),
            })
            .await
    }

    // ---- Preprocess: Initialized -> Queuing ----

    pub async fn preprocess(&mut self, deps: &JobDeps) -> Result<(), EngineError> {
        self.prepare_image(deps).await?;
        self.download_resources(deps).await?;
        self.process_resources().await?;
        self.download_inputs(deps).await?;
        self.process_inputs().await?;
        self.record.transition(JobState::Queuing);
        self.notify_state().await?;
        Ok(())
    }

    async fn prepare_image(&mut self, deps: &JobDeps) -> Result<(), EngineError> {
        self.record.transition(JobState::PreparingImage);
        self.notify_state().await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<PullProgress>();
        let notify = self.notify.clone();
        let state = self.record.state;
        let forward = tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                let _ = notify
                    .send(ExecNotificationRequest {
                        state: state.to_string(),
                        id: progress.id.unwrap_or_default(),
                        message: progress.status,
                        current: progress.current.unwrap_or(0),
                        total: progress.total.unwrap_or(0),
                        flag: 0,
                        outputs: Vec::new(),
                    })
                    .await;
            }
        });

        let image = self.record.lease.image.clone();
        let result = deps
            .container
            .pull_image(&image.url, image.auth.as_deref(), &mut |p| {
                let _ = tx.send(p);
            })
            .await;
        drop(tx);
        let _ = forward.await;
        result?;
        Ok(())
    }

    async fn download_resources(&mut self, deps: &JobDeps) -> Result<(), EngineError> {
        self.record.transition(JobState::DownloadingResources);
        self.notify_state().await?;

        let resource_dir = self.record.resource_dir();
        for resource in self.record.lease.resources.clone() {
            let dest = resource_dir.join(&resource.path);
            let downloader = deps.resources.fetch(resource.url.clone(), dest);

            let mut ticker = tokio::time::interval(Duration::from_millis(500));
            ticker.tick().await;
            let done = downloader.done();
            tokio::pin!(done);
            loop {
                tokio::select! {
                    res = &mut done => {
                        self.notify_progress(&resource.path, downloader.current(), downloader.total()).await?;
                        res.map_err(|e| EngineError::Core(WorkerError::DownloadFailed {
                            url: resource.url.clone(),
                            reason: e.to_string(),
                        }))?;
                        break;
                    }
                    _ = ticker.tick() => {
                        self.notify_progress(&resource.path, downloader.current(), downloader.total()).await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn notify_progress(&self, path: &str, current: u64, total: Option<u64>) -> Result<(), EngineError> {
        self.notify
            .send(ExecNotificationRequest {
                state: self.record.state.to_string(),
                id: String::new(),
                message: path.to_string(),
                current,
                total: total.unwrap_or(0),
                flag: self.flag_bits(),
                outputs: Vec::new(),
            })
            .await
    }

    /// Reserved pass-through: no content-addressable validation is defined
    /// yet, but the phase still advances the state.
    async fn process_resources(&mut self) -> Result<(), EngineError> {
        self.record.transition(JobState::ProcessingResources);
        self.notify_state().await?;
        Ok(())
    }

    async fn download_inputs(&mut self, deps: &JobDeps) -> Result<(), EngineError> {
        self.record.transition(JobState::DownloadingInputs);
        self.notify_state().await?;

        let data_dir = self.record.data_dir();
        let cancel = CancellationToken::new();
        let mut set = JoinSet::new();
        for input in self.record.lease.inputs.clone() {
            let resources = deps.resources.clone();
            let dest = data_dir.join(&input.path);
            let url = input.request.as_ref().map(|r| r.url.clone()).unwrap_or_default();
            let cancel = cancel.clone();
            set.spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => Err((url.clone(), "canceled by sibling failure".to_string())),
                    res = async {
                        let downloader = resources.fetch(url.clone(), dest);
                        downloader.done().await
                    } => res.map_err(|e| (url.clone(), e.to_string())).map(|()| input.path),
                }
            });
        }

        let mut first_err: Option<(String, String)> = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(path)) => {
                    self.notify_line(format!("downloaded {path}")).await?;
                }
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                        cancel.cancel();
                    }
                }
                Err(join_err) => {
                    if first_err.is_none() {
                        first_err = Some((String::new(), join_err.to_string()));
                        cancel.cancel();
                    }
                }
            }
        }
        if let Some((url, reason)) = first_err {
            return Err(EngineError::Core(WorkerError::DownloadFailed { url, reason }));
        }
        Ok(())
    }

    /// Reserved pass-through, mirroring [`Self::process_resources`].
    async fn process_inputs(&mut self) -> Result<(), EngineError> {
        self.record.transition(JobState::ProcessingInputs);
        self.notify_state().await?;
        Ok(())
    }

    // ---- Run: Queuing -> Running -> ProcessingOutputs ----

    /// Attaches to `container_record`'s underlying runtime container,
    /// initializing it on first use, clearing any prior job's staged
    /// data/output, and moving this job's staged inputs in.
    pub async fn prepare_container(
        &mut self,
        deps: &JobDeps,
        container_record: &mut ContainerRecord,
    ) -> Result<ContainerId, EngineError> {
        self.record.transition(JobState::PreparingContainer);
        self.notify_state().await?;

        let container_id = match container_record.id {
            Some(id) => id,
            None => {
                let (tx, mut rx) = mpsc::unbounded_channel::<PullProgress>();
                let notify = self.notify.clone();
                let state = self.record.state;
                let forward = tokio::spawn(async move {
                    while let Some(progress) = rx.recv().await {
                        let _ = notify
                            .send(ExecNotificationRequest {
                                state: state.to_string(),
                                id: progress.id.unwrap_or_default(),
                                message: progress.status,
                                current: progress.current.unwrap_or(0),
                                total: progress.total.unwrap_or(0),
                                flag: 0,
                                outputs: Vec::new(),
                            })
                            .await;
                    }
                });

                let id = deps
                    .container
                    .init(
                        &container_record.image_url,
                        container_record.image_auth.as_deref(),
                        &container_record.binds,
                        container_record.gpu_opt,
                        &container_record.work_dir,
                        &self.record.resource_dir(),
                        &mut |p| {
                            let _ = tx.send(p);
                        },
                    )
                    .await;
                drop(tx);
                let _ = forward.await;
                let id = id?;
                container_record.id = Some(id);
                id
            }
        };

        let container_data_dir = container_record.work_dir.join("data");
        let container_output_dir = container_record.work_dir.join("output");
        clear_dir(&container_data_dir).await?;
        clear_dir(&container_output_dir).await?;
        move_dir_contents(&self.record.data_dir(), &container_data_dir).await?;

        self.record.container_id = Some(container_id);
        Ok(container_id)
    }

    /// Runs the lease's command inside the attached container, forwarding
    /// each stdout/stderr line as a notification, then moves the
    /// container's output volume into the job's own output directory.
    pub async fn execute(
        &mut self,
        deps: &JobDeps,
        container_work_dir: &Path,
        container_id: ContainerId,
    ) -> Result<(), EngineError> {
        self.record.transition(JobState::Running);
        self.notify_state().await?;

        let mut stream = deps.container.run(&container_id, self.record.lease.cmd.clone()).await?;
        let mut exit_code = 0i64;
        while let Some(item) = stream.next().await {
            match item? {
                ExecOutput::Stdout(bytes) | ExecOutput::Stderr(bytes) => {
                    for line in String::from_utf8_lossy(&bytes).lines() {
                        if !line.is_empty() {
                            self.notify_line(line.to_string()).await?;
                        }
                    }
                }
                ExecOutput::Exit(code) => exit_code = code,
            }
        }
        drop(stream);

        if exit_code != 0 {
            return Err(EngineError::Core(WorkerError::ContainerRuntime(format!(
                "command exited with status {exit_code}"
            ))));
        }

        let container_output_dir = container_work_dir.join("output");
        move_dir_contents(&container_output_dir, &self.record.output_dir()).await?;

        self.record.transition(JobState::ProcessingOutputs);
        self.notify_state().await?;
        Ok(())
    }

    // ---- Postprocess: ProcessingOutputs -> Success ----

    pub async fn postprocess(&mut self, deps: &JobDeps) -> Result<(), EngineError> {
        let output_dir = self.record.output_dir();
        let cancel = CancellationToken::new();
        let mut set = JoinSet::new();
        for output in self.record.lease.outputs.clone() {
            let http = deps.http.clone();
            let output_dir = output_dir.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => Err("canceled by sibling failure".to_string()),
                    res = process_output(http, output_dir, output) => Ok(res),
                }
            });
        }

        let mut results = Vec::new();
        let mut hard_err = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(reason)) => {
                    if hard_err.is_none() {
                        hard_err = Some(reason);
                        cancel.cancel();
                    }
                }
                Err(join_err) => {
                    if hard_err.is_none() {
                        hard_err = Some(join_err.to_string());
                        cancel.cancel();
                    }
                }
            }
        }
        if let Some(reason) = hard_err {
            return Err(EngineError::Core(WorkerError::OutputFailed(reason)));
        }

        results.sort_by(|a, b| a.id.cmp(&b.id));
        self.record.outputs = results;
        self.record.succeed();
        Ok(())
    }

    /// Sends the one terminal notification every Job gets exactly once,
    /// closes its notification stream, and removes its work directory.
    /// Cleanup failures are logged, never re-raised.
    pub async fn finish(self) -> Result<(), EngineError> {
        let is_error = self.record.err.is_some();
        let outputs: Vec<OutputResultWire> =
            if matches!(self.record.state, JobState::Success) { self.record.outputs.iter().map(Into::into).collect() } else { Vec::new() };

        let notification = ExecNotificationRequest {
            state: self.record.state.to_string(),
            id: String::new(),
            message: self.record.err.clone().unwrap_or_default(),
            current: 0,
            total: 0,
            flag: if is_error { 1 } else { self.flag_bits() },
            outputs,
        };
        self.notify.send(notification).await?;
        self.notify.close().await?;

        if let Err(e) = tokio::fs::remove_dir_all(&self.record.work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(job_id = %self.record.job_id(), error = %e, "failed to remove job work dir");
            }
        }
        Ok(())
    }
}

async fn process_output(http: reqwest::Client, output_dir: PathBuf, output: FileRef) -> OutputResult {
    let path = output_dir.join(&output.path);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return OutputResult {
                id: output.id,
                status: OutputStatus::Error,
                message: Some(format!("output {} not found", output.path)),
                content: None,
            }
        }
    };

    match &output.request {
        None => {
            if bytes.len() > MAX_INLINE_OUTPUT_BYTES {
                OutputResult {
                    id: output.id,
                    status: OutputStatus::Error,
                    message: Some(format!(
                        "output too large: {} bytes exceeds the {} byte inline cap",
                        bytes.len(),
                        MAX_INLINE_OUTPUT_BYTES
                    )),
                    content: None,
                }
            } else {
                OutputResult {
                    id: output.id,
                    status: OutputStatus::Success,
                    message: None,
                    content: Some(String::from_utf8_lossy(&bytes).into_owned()),
                }
            }
        }
        Some(request) => {
            let method = reqwest::Method::from_bytes(request.method.as_bytes()).unwrap_or(reqwest::Method::PUT);
            let mut builder = http.request(method, &request.url).body(bytes);
            for (key, value) in &request.headers {
                builder = builder.header(key, value);
            }
            match builder.send().await {
                Ok(response) if response.status().is_success() => {
                    OutputResult { id: output.id, status: OutputStatus::Success, message: None, content: None }
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    OutputResult {
                        id: output.id,
                        status: OutputStatus::Error,
                        message: Some(format!("upload failed with status {status}: {body}")),
                        content: None,
                    }
                }
                Err(e) => OutputResult {
                    id: output.id,
                    status: OutputStatus::Error,
                    message: Some(e.to_string()),
                    content: None,
                },
            }
        }
    }
}

/// Removes everything under `dir` without removing `dir` itself, tolerating
/// a directory that doesn't exist yet.
async fn clear_dir(dir: &Path) -> Result<(), EngineError> {
    tokio::fs::create_dir_all(dir).await?;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}

/// Moves every entry directly under `src` into `dst`, creating `dst` if
/// needed. Used to stage a job's inputs into its attached container's
/// volume, and to collect a container's output volume back into the job.
async fn move_dir_contents(src: &Path, dst: &Path) -> Result<(), EngineError> {
    tokio::fs::create_dir_all(dst).await?;
    if tokio::fs::metadata(src).await.is_err() {
        return Ok(());
    }
    let mut entries = tokio::fs::read_dir(src).await?;
    while let Some(entry) = entries.next_entry().await? {
        let target = dst.join(entry.file_name());
        tokio::fs::rename(entry.path(), target).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
