// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversions between the domain types in `wk-core` and the generated wire
//! types in [`crate::pb`], so callers in `wk-adapters`/`wk-engine` build and
//! consume `wk-core` values exclusively.

use std::collections::HashMap;

use wk_core::{
    ContainerId, ExecId, FileRef, GpuOption, ImageBinds, ImageSpec, JobId, JobMetadata,
    OutputResult, OutputStatus, RequestSpec, ResourceFile, ResourceId,
};

use crate::pb;

impl From<&FileRef> for pb::FileRefWire {
    fn from(f: &FileRef) -> Self {
        let (request, has_request) = match &f.request {
            Some(r) => (
                pb::RequestSpecWire {
                    method: r.method.clone(),
                    url: r.url.clone(),
                    headers: r.headers.clone(),
                },
                true,
            ),
            None => (pb::RequestSpecWire::default(), false),
        };
        pb::FileRefWire { id: f.id.clone(), path: f.path.clone(), request: Some(request), has_request }
    }
}

impl From<&pb::FileRefWire> for FileRef {
    fn from(w: &pb::FileRefWire) -> Self {
        let request = if w.has_request {
            w.request.as_ref().map(|r| RequestSpec {
                method: r.method.clone(),
                url: r.url.clone(),
                headers: r.headers.clone(),
            })
        } else {
            None
        };
        FileRef { id: w.id.clone(), path: w.path.clone(), request }
    }
}

impl From<&ResourceFile> for pb::ResourceFileWire {
    fn from(r: &ResourceFile) -> Self {
        pb::ResourceFileWire { path: r.path.clone(), url: r.url.clone() }
    }
}

impl From<&pb::ResourceFileWire> for ResourceFile {
    fn from(w: &pb::ResourceFileWire) -> Self {
        ResourceFile { path: w.path.clone(), url: w.url.clone() }
    }
}

impl From<GpuOption> for pb::GpuOptionWire {
    fn from(opt: GpuOption) -> Self {
        match opt {
            GpuOption::None => pb::GpuOptionWire::GpuOptionNone,
            GpuOption::Preferred => pb::GpuOptionWire::GpuOptionPreferred,
            GpuOption::Required => pb::GpuOptionWire::GpuOptionRequired,
        }
    }
}

impl From<pb::GpuOptionWire> for GpuOption {
    fn from(w: pb::GpuOptionWire) -> Self {
        match w {
            pb::GpuOptionWire::GpuOptionNone => GpuOption::None,
            pb::GpuOptionWire::GpuOptionPreferred => GpuOption::Preferred,
            pb::GpuOptionWire::GpuOptionRequired => GpuOption::Required,
        }
    }
}

impl From<&ImageSpec> for pb::ImageSpecWire {
    fn from(image: &ImageSpec) -> Self {
        let mut binds = HashMap::new();
        for volume in wk_core::LOGICAL_VOLUMES {
            binds.insert(volume.to_string(), image.binds.path_for(volume).to_string());
        }
        pb::ImageSpecWire {
            url: image.url.clone(),
            auth: image.auth.clone().unwrap_or_default(),
            binds,
        }
    }
}

impl From<&pb::ImageSpecWire> for ImageSpec {
    fn from(w: &pb::ImageSpecWire) -> Self {
        let binds: ImageBinds = w.binds.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        ImageSpec {
            url: w.url.clone(),
            auth: if w.auth.is_empty() { None } else { Some(w.auth.clone()) },
            binds,
        }
    }
}

impl From<&JobMetadata> for pb::JobMetadataWire {
    fn from(lease: &JobMetadata) -> Self {
        pb::JobMetadataWire {
            job_id: lease.job_id.to_string(),
            exec_id: lease.exec_id.to_string(),
            image: Some((&lease.image).into()),
            cmd: lease.cmd.clone(),
            resource_id: lease.resource_id.to_string(),
            resources: lease.resources.iter().map(Into::into).collect(),
            inputs: lease.inputs.iter().map(Into::into).collect(),
            outputs: lease.outputs.iter().map(Into::into).collect(),
            gpu_conf: pb::GpuOptionWire::from(lease.gpu_conf) as i32,
        }
    }
}

impl From<&pb::JobMetadataWire> for JobMetadata {
    fn from(w: &pb::JobMetadataWire) -> Self {
        JobMetadata {
            job_id: JobId::from_string(&w.job_id),
            exec_id: ExecId::from_string(&w.exec_id),
            image: w.image.as_ref().map(Into::into).unwrap_or_default(),
            cmd: w.cmd.clone(),
            resource_id: ResourceId::from_string(&w.resource_id),
            resources: w.resources.iter().map(Into::into).collect(),
            inputs: w.inputs.iter().map(Into::into).collect(),
            outputs: w.outputs.iter().map(Into::into).collect(),
            gpu_conf: pb::GpuOptionWire::try_from(w.gpu_conf).unwrap_or(pb::GpuOptionWire::GpuOptionNone).into(),
        }
    }
}

impl From<&OutputResult> for pb::OutputResultWire {
    fn from(o: &OutputResult) -> Self {
        pb::OutputResultWire {
            id: o.id.clone(),
            success: matches!(o.status, OutputStatus::Success),
            message: o.message.clone().unwrap_or_default(),
            content: o.content.clone().unwrap_or_default(),
        }
    }
}

impl From<&pb::OutputResultWire> for OutputResult {
    fn from(w: &pb::OutputResultWire) -> Self {
        OutputResult {
            id: w.id.clone(),
            status: if w.success { OutputStatus::Success } else { OutputStatus::Error },
            message: if w.message.is_empty() { None } else { Some(w.message.clone()) },
            content: if w.content.is_empty() { None } else { Some(w.content.clone()) },
        }
    }
}

/// Builds the `id = <jobId>` / `id = <containerId>` header value used by
/// `NotifyExecStatus` and a few other per-entity headers.
pub fn job_header_value(job_id: JobId) -> String {
    job_id.to_string()
}

pub fn container_header_value(container_id: ContainerId) -> String {
    container_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wk_core::GpuOption;

    #[test]
    fn file_ref_roundtrips_through_wire_for_inline_output() {
        let original = FileRef::inline_output("o1", "r.txt");
        let wire: pb::FileRefWire = (&original).into();
        let back: FileRef = (&wire).into();
        assert_eq!(original, back);
    }

    #[test]
    fn file_ref_roundtrips_through_wire_for_fetched_output() {
        let original = FileRef::fetched(
            "o1",
            "r.txt",
            RequestSpec { method: "PUT".into(), url: "http://x/y".into(), headers: Default::default() },
        );
        let wire: pb::FileRefWire = (&original).into();
        let back: FileRef = (&wire).into();
        assert_eq!(original, back);
    }

    #[test]
    fn gpu_option_roundtrips() {
        for opt in [GpuOption::None, GpuOption::Preferred, GpuOption::Required] {
            let wire: pb::GpuOptionWire = opt.into();
            let back: GpuOption = wire.into();
            assert_eq!(opt, back);
        }
    }

    #[test]
    fn image_spec_roundtrips_known_logical_volumes() {
        let mut binds = ImageBinds::default();
        binds.insert("output", "/mnt/out");
        let original = ImageSpec { url: "base".into(), auth: Some("tok".into()), binds };
        let wire: pb::ImageSpecWire = (&original).into();
        let back: ImageSpec = (&wire).into();
        assert_eq!(back.url, "base");
        assert_eq!(back.auth.as_deref(), Some("tok"));
        assert_eq!(back.binds.path_for("output"), "/mnt/out");
    }
}
