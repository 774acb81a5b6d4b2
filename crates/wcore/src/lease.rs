// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable lease (`JobMetadata`) handed out by `GetNewJob`, and the
//! small value types it is built from.

use std::collections::HashMap;

use crate::ids::{JobId, ExecId, ResourceId};

/// GPU requirement a lease attaches to its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GpuOption {
    None,
    Preferred,
    Required,
}

impl GpuOption {
    /// True when the container should request GPU devices at all.
    pub fn wants_gpu(self) -> bool {
        !matches!(self, GpuOption::None)
    }
}

impl Default for GpuOption {
    fn default() -> Self {
        GpuOption::None
    }
}

/// The four container-internal mount points a lease may bind, named by the
/// logical role rather than by container path. Validated on construction so
/// callers can't accidentally introduce a fifth logical volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageBinds(HashMap<String, String>);

/// The logical volume names a lease's `image.binds` map may use.
pub const LOGICAL_VOLUMES: [&str; 4] = ["data", "source", "output", "resource"];

impl ImageBinds {
    /// Default in-container path for a logical volume absent from the map.
    pub fn default_path(volume: &str) -> &'static str {
        match volume {
            "data" => "/data",
            "source" => "/source",
            "output" => "/output",
            "resource" => "/resource",
            _ => "/data",
        }
    }

    /// Container-side path for `volume`, falling back to the default.
    pub fn path_for(&self, volume: &str) -> &str {
        self.0
            .get(volume)
            .map(String::as_str)
            .unwrap_or_else(|| Self::default_path(volume))
    }

    pub fn insert(&mut self, volume: impl Into<String>, container_path: impl Into<String>) {
        self.0.insert(volume.into(), container_path.into());
    }
}

impl FromIterator<(String, String)> for ImageBinds {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().filter(|(k, _)| LOGICAL_VOLUMES.contains(&k.as_str())).collect())
    }
}

/// The runtime image a lease's container is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageSpec {
    pub url: String,
    pub auth: Option<String>,
    pub binds: ImageBinds,
}

/// HTTP request shape used to fetch an input or upload an output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// One file reference on the input or output side of a lease.
///
/// Unifies what used to be inconsistent `file.Url`/`file.Path` pairs into a
/// single shape; an output with `request: None` is returned inline rather
/// than uploaded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileRef {
    pub id: String,
    pub path: String,
    pub request: Option<RequestSpec>,
}

impl FileRef {
    pub fn inline_output(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self { id: id.into(), path: path.into(), request: None }
    }

    pub fn fetched(id: impl Into<String>, path: impl Into<String>, request: RequestSpec) -> Self {
        Self { id: id.into(), path: path.into(), request: Some(request) }
    }

    /// True for an output that is returned inline in the terminal
    /// notification rather than uploaded via `request`.
    pub fn is_inline(&self) -> bool {
        self.request.is_none()
    }
}

/// One file composing a shared, content-addressed resource set.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceFile {
    pub path: String,
    pub url: String,
}

/// Immutable record received from the scheduler for one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobMetadata {
    pub job_id: JobId,
    pub exec_id: ExecId,
    pub image: ImageSpec,
    pub cmd: Vec<String>,
    pub resource_id: ResourceId,
    pub resources: Vec<ResourceFile>,
    pub inputs: Vec<FileRef>,
    pub outputs: Vec<FileRef>,
    pub gpu_conf: GpuOption,
}

crate::builder! {
    pub struct JobMetadataBuilder => JobMetadata {
        set { job_id: JobId = JobId::new() }
        set { exec_id: ExecId = ExecId::new() }
        set { image: ImageSpec = ImageSpec::default() }
        set { cmd: Vec<String> = Vec::new() }
        set { resource_id: ResourceId = ResourceId::new() }
        set { resources: Vec<ResourceFile> = Vec::new() }
        set { inputs: Vec<FileRef> = Vec::new() }
        set { outputs: Vec<FileRef> = Vec::new() }
        set { gpu_conf: GpuOption = GpuOption::None }
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
