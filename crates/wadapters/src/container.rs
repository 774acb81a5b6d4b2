// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container (C6): a single job-executing container over the local Docker
//! daemon. One [`Container`] wraps at most one `bollard` container id and
//! enforces the "one job at a time" invariant one level up, in
//! `wk-core::ContainerRecord`; this type only talks to the Docker API.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::service::{DeviceRequest, HostConfig, LogOutput};
use bollard::Docker;
use futures_util::{Stream, StreamExt};
use tracing::{debug, instrument, warn};

use wk_core::{ContainerId, GpuOption, ImageBinds, LOGICAL_VOLUMES};

use crate::error::AdapterError;

/// A line emitted while pulling an image, forwarded to C7 as progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullProgress {
    pub id: Option<String>,
    pub status: String,
    pub current: Option<u64>,
    pub total: Option<u64>,
}

/// One line of combined stdout/stderr from a running exec, or its final
/// exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutput {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Exit(i64),
}

/// The label every worker-created container carries, so orphan cleanup
/// can find containers belonging to this host via a list-with-filter call
/// without tracking ids elsewhere.
pub fn starter_label(hostname: &str) -> String {
    format!("run.sath.starter={hostname}")
}

pub struct Container {
    docker: Docker,
    hostname: String,
}

impl Container {
    pub fn new(docker: Docker, hostname: impl Into<String>) -> Self {
        Self { docker, hostname: hostname.into() }
    }

    /// Pulls `image_url`, streaming progress through `on_progress`, then
    /// creates and starts a container bound to `binds` with `gpu_opt`'s
    /// device request applied. Returns the new container id.
    #[instrument(skip(self, on_progress), fields(image = %image_url))]
    pub async fn init(
        &self,
        image_url: &str,
        image_auth: Option<&str>,
        binds: &ImageBinds,
        gpu_opt: GpuOption,
        job_work_dir: &Path,
        resource_dir: &Path,
        mut on_progress: impl FnMut(PullProgress),
    ) -> Result<ContainerId, AdapterError> {
        self.pull_image(image_url, image_auth, &mut on_progress).await?;

        let bind_strings = build_binds(binds, job_work_dir, resource_dir)?;

        let mut device_requests = Vec::new();
        if gpu_opt.wants_gpu() {
            device_requests.push(DeviceRequest {
                driver: Some("nvidia".to_string()),
                count: Some(-1),
                capabilities: Some(vec![vec!["gpu".to_string()]]),
                ..Default::default()
            });
        }

        let config = Config {
            image: Some(image_url.to_string()),
            tty: Some(true),
            open_stdin: Some(true),
            labels: Some(HashMap::from([(
                "run.sath.starter".to_string(),
                self.hostname.clone(),
            )])),
            host_config: Some(HostConfig {
                binds: Some(bind_strings),
                device_requests: (!device_requests.is_empty()).then_some(device_requests),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(
                Some(CreateContainerOptions::<&str> { name: "", platform: None }),
                config,
            )
            .await?;

        if let Err(e) = self.docker.start_container::<String>(&created.id, None).await {
            warn!(container_id = %created.id, error = %e, "container failed to start cleanly");
        }

        Ok(ContainerId::from_string(&created.id))
    }

    /// Pulls `image_url` alone, streaming progress through `on_progress`.
    ///
    /// Exposed separately from [`Container::init`] so the *PreparingImage*
    /// phase can report per-layer pull progress before a
    /// Container is ever created; `init` calls this again when a fresh
    /// Container is actually built, which is a harmless no-op pull once the
    /// image is already cached locally.
    pub async fn pull_image(
        &self,
        image_url: &str,
        image_auth: Option<&str>,
        on_progress: &mut impl FnMut(PullProgress),
    ) -> Result<(), AdapterError> {
        let credentials = image_auth.map(|token| bollard::auth::DockerCredentials {
            identitytoken: Some(token.to_string()),
            ..Default::default()
        });

        let options = CreateImageOptions { from_image: image_url.to_string(), ..Default::default() };
        let mut stream = self.docker.create_image(Some(options), None, credentials);
        while let Some(event) = stream.next().await {
            let info = event?;
            if let Some(error) = info.error {
                return Err(AdapterError::Container(bollard::errors::Error::DockerResponseServerError {
                    status_code: 500,
                    message: error,
                }));
            }
            on_progress(PullProgress {
                id: info.id,
                status: info.status.unwrap_or_default(),
                current: info.progress_detail.as_ref().and_then(|d| d.current).map(|v| v as u64),
                total: info.progress_detail.as_ref().and_then(|d| d.total).map(|v| v as u64),
            });
        }
        Ok(())
    }

    /// Runs `cmd` inside `container_id`, returning a stream of combined
    /// stdout/stderr lines terminated by the exit code.
    #[instrument(skip(self, cmd), fields(container_id = %container_id))]
    pub async fn run(
        &self,
        container_id: &ContainerId,
        cmd: Vec<String>,
    ) -> Result<impl Stream<Item = Result<ExecOutput, AdapterError>> + '_, AdapterError> {
        let exec = self
            .docker
            .create_exec(
                container_id.as_str(),
                CreateExecOptions {
                    cmd: Some(cmd),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let exec_id = exec.id.clone();
        let started = self.docker.start_exec(&exec.id, None).await?;
        let output = match started {
            StartExecResults::Attached { output, .. } => output,
            StartExecResults::Detached => {
                return Err(AdapterError::Container(bollard::errors::Error::DockerResponseServerError {
                    status_code: 500,
                    message: "exec started detached".into(),
                }))
            }
        };

        let docker = self.docker.clone();
        let stream = output.map(move |item| -> Result<ExecOutput, AdapterError> {
            match item? {
                LogOutput::StdOut { message } => Ok(ExecOutput::Stdout(message.to_vec())),
                LogOutput::StdErr { message } => Ok(ExecOutput::Stderr(message.to_vec())),
                LogOutput::StdIn { .. } | LogOutput::Console { .. } => {
                    Ok(ExecOutput::Stdout(Vec::new()))
                }
            }
        });

        let exit_stream = futures_util::stream::once(async move {
            let inspected = docker.inspect_exec(&exec_id).await?;
            Ok(ExecOutput::Exit(inspected.exit_code.unwrap_or(-1)))
        });

        Ok(stream.chain(exit_stream))
    }

    pub async fn stop(&self, container_id: &ContainerId) -> Result<(), AdapterError> {
        self.docker.stop_container(container_id.as_str(), None).await?;
        Ok(())
    }

    pub async fn remove(&self, container_id: &ContainerId) -> Result<(), AdapterError> {
        self.docker
            .remove_container(
                container_id.as_str(),
                Some(RemoveContainerOptions { force: true, ..Default::default() }),
            )
            .await?;
        Ok(())
    }

    /// Suspends every process in the container without stopping it, so a
    /// resumed job picks up exactly where it left off.
    pub async fn pause(&self, container_id: &ContainerId) -> Result<(), AdapterError> {
        self.docker.pause_container(container_id.as_str()).await?;
        Ok(())
    }

    pub async fn unpause(&self, container_id: &ContainerId) -> Result<(), AdapterError> {
        self.docker.unpause_container(container_id.as_str()).await?;
        Ok(())
    }

    /// True once the runtime reports the container as paused — the
    /// observable signal that a pause actually suspended its processes.
    pub async fn is_paused(&self, container_id: &ContainerId) -> Result<bool, AdapterError> {
        let details = self.docker.inspect_container(container_id.as_str(), None).await?;
        Ok(details.state.and_then(|s| s.paused).unwrap_or(false))
    }

    /// Containers this host previously started, found by the starter label
    /// rather than tracked locally, so a fresh daemon can recognize and
    /// remove what an earlier instance (or a crash) left behind.
    pub async fn list_orphans(&self) -> Result<Vec<String>, AdapterError> {
        let label = starter_label(&self.hostname);
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![label]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions { all: true, filters, ..Default::default() }))
            .await?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    /// Removes every exited container bearing the starter label — the
    /// periodic sweep named alongside startup orphan cleanup.
    pub async fn prune_exited(&self) -> Result<(), AdapterError> {
        let label = starter_label(&self.hostname);
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![label]);
        self.docker
            .prune_containers(Some(bollard::container::PruneContainersOptions { filters }))
            .await?;
        Ok(())
    }
}

/// Builds `host:container[:ro]` bind strings for every logical volume with
/// an entry in `binds`, creating the host-side directory if absent.
/// `resource` is mounted read-only — a job never writes into the shared
/// resource cache.
fn build_binds(
    binds: &ImageBinds,
    job_work_dir: &Path,
    resource_dir: &Path,
) -> Result<Vec<String>, AdapterError> {
    let mut result = Vec::new();
    for volume in LOGICAL_VOLUMES {
        let host_dir = match volume {
            "resource" => resource_dir.to_path_buf(),
            other => job_work_dir.join(other),
        };
        std::fs::create_dir_all(&host_dir)?;
        let container_path = binds.path_for(volume);
        let host_dir = host_dir.to_str().ok_or_else(|| AdapterError::Container(
            bollard::errors::Error::IOError {
                err: std::io::Error::new(std::io::ErrorKind::InvalidData, "non-utf8 bind path"),
            },
        ))?;
        let suffix = if volume == "resource" { ":ro" } else { "" };
        result.push(format!("{host_dir}:{container_path}{suffix}"));
    }
    Ok(result)
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
