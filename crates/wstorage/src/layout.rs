// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout under a worker's configured home directory.
//!
//! ```text
//! <home>/meta.db
//! <home>/data/job_<execId>/{data,output}
//! <home>/data/resource_<resourceId>/...
//! <home>/data/container_<rand>/...
//! <home>/log/{jobs,err,out}.log
//! ```

use std::path::{Path, PathBuf};

use wk_core::{ContainerId, ExecId, ResourceId};

/// Owns a worker's home directory and derives every path under it.
#[derive(Debug, Clone)]
pub struct HomeLayout {
    home: PathBuf,
}

impl HomeLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn data_root(&self) -> PathBuf {
        self.home.join("data")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.home.join("log")
    }

    pub fn job_work_dir(&self, exec_id: ExecId) -> PathBuf {
        self.data_root().join(format!("job_{exec_id}"))
    }

    pub fn resource_dir(&self, resource_id: ResourceId) -> PathBuf {
        self.data_root().join(format!("resource_{resource_id}"))
    }

    pub fn container_work_dir(&self, container_id: ContainerId) -> PathBuf {
        self.data_root().join(format!("container_{container_id}"))
    }

    pub fn jobs_log(&self) -> PathBuf {
        self.log_dir().join("jobs.log")
    }

    pub fn err_log(&self) -> PathBuf {
        self.log_dir().join("err.log")
    }

    pub fn out_log(&self) -> PathBuf {
        self.log_dir().join("out.log")
    }

    /// Creates `data/` and `log/` under the home directory, idempotently.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.data_root())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
