// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure system-info reporter consumed by the Connection's handshake
//! (`SystemInfo`). No persistent state, no background task.

use sysinfo::System;
use wk_proto::pb::SystemInfo;

/// Collects a one-shot snapshot of CPU/memory, best-effort GPU inventory.
///
/// GPU absence is never an error — a lease with `gpuConf.opt = Required`
/// simply can't be satisfied by this worker, which the scheduler is
/// expected to account for when assigning work.
pub fn collect() -> SystemInfo {
    let mut sys = System::new_all();
    sys.refresh_all();

    let cpu_model = sys.cpus().first().map(|c| c.brand().to_string()).unwrap_or_default();
    let cpu_count = sys.cpus().len() as u32;
    let total_memory_bytes = sys.total_memory();
    let hostname = System::host_name().unwrap_or_default();
    let os = System::long_os_version().or_else(System::name).unwrap_or_default();
    let arch = System::cpu_arch();

    SystemInfo {
        hostname,
        os,
        arch,
        cpu_model,
        cpu_count,
        total_memory_bytes,
        gpu_models: probe_gpus(),
    }
}

/// Best-effort GPU enumeration via `nvidia-smi`. Absence of the binary, or
/// any failure running it, yields an empty list rather than an error.
fn probe_gpus() -> Vec<String> {
    let output = std::process::Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .output();

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_reports_a_nonzero_cpu_count_on_any_real_machine() {
        let info = collect();
        assert!(info.cpu_count > 0 || info.cpu_model.is_empty());
    }

    #[test]
    fn probe_gpus_never_panics_when_nvidia_smi_is_absent() {
        let _ = probe_gpus();
    }
}
