// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler (C8): the single place that decides which job runs next and in
//! which container. Everything that mutates `containers`/the active-job
//! count happens on the one task running [`Scheduler::run`]; job pipelines
//! themselves run concurrently in their own spawned tasks and report back
//! over a channel rather than touching scheduler state directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wk_core::{ContainerId, ContainerRecord, JobId, JobMetadata};

use crate::error::EngineError;
use crate::job::{JobDeps, JobEngine};

/// Tuning knobs a daemon binary reads from its environment and hands to the
/// scheduler at construction.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrent_jobs: usize,
    pub fetch_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_concurrent_jobs: 1, fetch_interval: Duration::from_secs(30) }
    }
}

/// What [`crate::daemon::Daemon::status`] reports, and what `Start`/`Pause`
/// commands transition between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Running,
    Paused,
    /// A `Pause` was accepted but the in-flight jobs haven't finished
    /// pausing their containers yet.
    Pausing,
    Invalid,
}

struct ContainerSlot {
    record: AsyncMutex<ContainerRecord>,
    /// Wakes a job parked in `pendingJobs` for this slot (spec §4.6) as soon
    /// as the job occupying it detaches, so the next compatible job can
    /// attach instead of failing outright.
    freed: Notify,
}

type JobOutcome = (JobId, Result<(), EngineError>);

pub struct Scheduler {
    deps: JobDeps,
    work_root: PathBuf,
    config: SchedulerConfig,
    status: RwLock<SchedulerStatus>,
    action_lock: AsyncMutex<()>,
    containers: AsyncMutex<HashMap<String, Arc<ContainerSlot>>>,
    active_jobs: AtomicUsize,
    done_tx: mpsc::UnboundedSender<JobOutcome>,
}

impl Scheduler {
    pub fn new(
        deps: JobDeps,
        work_root: PathBuf,
        config: SchedulerConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<JobOutcome>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(Self {
            deps,
            work_root,
            config,
            status: RwLock::new(SchedulerStatus::Paused),
            action_lock: AsyncMutex::new(()),
            containers: AsyncMutex::new(HashMap::new()),
            active_jobs: AtomicUsize::new(0),
            done_tx,
        });
        (scheduler, done_rx)
    }

    pub fn status(&self) -> SchedulerStatus {
        *self.status.read()
    }

    /// Moves to `Running`, allowing the fetch ticker to start pulling work.
    /// Returns [`EngineError::ActionBusy`] if a `Start`/`Pause` is already
    /// in flight.
    pub async fn start(&self) -> Result<(), EngineError> {
        let _guard = self.action_lock.try_lock().map_err(|_| EngineError::ActionBusy)?;
        *self.status.write() = SchedulerStatus::Running;
        info!("scheduler started");
        Ok(())
    }

    /// Moves to `Pausing` immediately and to `Paused` once every attached
    /// container has actually suspended (I3's pause/resume overlay, driven
    /// from the Job side rather than modeled here).
    pub async fn pause(&self) -> Result<(), EngineError> {
        let _guard = self.action_lock.try_lock().map_err(|_| EngineError::ActionBusy)?;
        *self.status.write() = SchedulerStatus::Pausing;
        let containers = self.containers.lock().await;
        for slot in containers.values() {
            let record = slot.record.lock().await;
            if let Some(id) = record.id {
                if let Err(e) = self.deps.container.pause(&id).await {
                    warn!(container_id = %id, error = %e, "failed to pause container");
                }
            }
        }
        *self.status.write() = SchedulerStatus::Paused;
        info!("scheduler paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), EngineError> {
        let _guard = self.action_lock.try_lock().map_err(|_| EngineError::ActionBusy)?;
        let containers = self.containers.lock().await;
        for slot in containers.values() {
            let record = slot.record.lock().await;
            if let Some(id) = record.id {
                if let Err(e) = self.deps.container.unpause(&id).await {
                    warn!(container_id = %id, error = %e, "failed to resume container");
                }
            }
        }
        drop(containers);
        *self.status.write() = SchedulerStatus::Running;
        Ok(())
    }

    /// Drives the event loop: a 30s fetch ticker and the channel job
    /// pipelines report completion on. Nothing but this loop touches
    /// `containers`/`active_jobs` directly.
    pub async fn run(
        self: Arc<Self>,
        mut done_rx: mpsc::UnboundedReceiver<JobOutcome>,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(self.config.fetch_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.drain_containers().await;
                    return;
                }
                _ = ticker.tick() => {
                    self.maybe_fetch_and_dispatch().await;
                }
                Some((job_id, result)) = done_rx.recv() => {
                    self.active_jobs.fetch_sub(1, Ordering::SeqCst);
                    if let Err(e) = result {
                        warn!(job_id = %job_id, error = %e, "job ended with error");
                    }
                }
            }
        }
    }

    async fn maybe_fetch_and_dispatch(self: &Arc<Self>) {
        if *self.status.read() != SchedulerStatus::Running {
            return;
        }
        if self.active_jobs.load(Ordering::SeqCst) >= self.config.max_concurrent_jobs {
            return;
        }
        if self.deps.connection.current_user().is_none() {
            return;
        }
        match tokio::time::timeout(Duration::from_secs(5), self.fetch_new_job()).await {
            Ok(Ok(Some(lease))) => self.dispatch(lease).await,
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!(error = %e, "GetNewJob failed"),
            Err(_) => warn!("GetNewJob timed out"),
        }
    }

    async fn fetch_new_job(&self) -> Result<Option<JobMetadata>, EngineError> {
        let mut client = self.deps.connection.client();
        let response = client
            .get_new_job(tonic::Request::new(wk_proto::pb::GetNewJobRequest {}))
            .await
            .map_err(|status| EngineError::Core(wk_core::WorkerError::Transient(status.to_string())))?
            .into_inner();
        if !response.has_lease {
            return Ok(None);
        }
        Ok(response.lease.as_ref().map(Into::into))
    }

    /// Looks up (creating if absent) the container slot this lease's image
    /// shares with any other job already using it, and spawns the task that
    /// drives the lease through its full pipeline.
    async fn dispatch(self: &Arc<Self>, lease: JobMetadata) {
        self.active_jobs.fetch_add(1, Ordering::SeqCst);

        let job_work_dir = self.work_root.join(lease.job_id.to_string());
        let mut engine = JobEngine::new(self.deps.connection.clone(), lease.clone(), job_work_dir);
        let slot = self.container_slot_for(&lease).await;
        let deps = self.deps.clone();
        let done_tx = self.done_tx.clone();
        let job_id = lease.job_id;

        tokio::spawn(async move {
            let result = run_job(&mut engine, &deps, &slot).await;
            if let Err(ref e) = result {
                engine.record.fail(e.to_string());
            }
            if let Err(e) = engine.finish().await {
                warn!(job_id = %job_id, error = %e, "failed to close job notification stream");
            }
            let _ = done_tx.send((job_id, result));
        });
    }

    async fn container_slot_for(&self, lease: &JobMetadata) -> Arc<ContainerSlot> {
        let mut containers = self.containers.lock().await;
        let count = containers.len();
        containers
            .entry(lease.image.url.clone())
            .or_insert_with(|| {
                Arc::new(ContainerSlot {
                    record: AsyncMutex::new(ContainerRecord::new(
                        lease.image.url.clone(),
                        lease.gpu_conf,
                        lease.image.binds.clone(),
                        self.work_root.join(format!("container_{count}")),
                    )),
                    freed: Notify::new(),
                })
            })
            .clone()
    }

    /// Stops and removes every container this scheduler ever attached,
    /// called once on graceful shutdown.
    async fn drain_containers(&self) {
        let containers = self.containers.lock().await;
        for slot in containers.values() {
            let record = slot.record.lock().await;
            if let Some(id) = record.id {
                if let Err(e) = self.deps.container.stop(&id).await {
                    warn!(container_id = %id, error = %e, "failed to stop container during shutdown");
                }
                if let Err(e) = self.deps.container.remove(&id).await {
                    warn!(container_id = %id, error = %e, "failed to remove container during shutdown");
                }
            }
        }
    }
}

/// Drives one lease through attach -> preprocess -> run -> postprocess,
/// detaching the container slot it used whether the run succeeded or not.
async fn run_job(engine: &mut JobEngine, deps: &JobDeps, slot: &Arc<ContainerSlot>) -> Result<(), EngineError> {
    engine.preprocess(deps).await?;

    // Queuing: park here, like spec §4.6's `pendingJobs`, until this job's
    // image-compatible container slot is free to attach to.
    let container_id: ContainerId = loop {
        let mut record = slot.record.lock().await;
        if record.attach(engine.record.job_id()) {
            break engine.prepare_container(deps, &mut record).await?;
        }
        drop(record);
        slot.freed.notified().await;
    };

    let container_work_dir = slot.record.lock().await.work_dir.clone();
    let run_result = engine.execute(deps, &container_work_dir, container_id).await;

    {
        let mut record = slot.record.lock().await;
        record.detach();
    }
    // Rescheduling (spec §4.6's `rescheduleContainer`): wake the next job
    // parked on this slot now that it's free.
    slot.freed.notify_one();

    run_result?;
    engine.postprocess(deps).await
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
