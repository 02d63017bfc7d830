/// Cgroup v2 resource group management: one node, one `pids` limit
use crate::types::{CgroupConfig, ContainerError, Result};
use std::fs::{self, DirBuilder};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

pub struct Cgroup {
    name: String,
    cgroup_path: PathBuf,
}

impl Cgroup {
    /// Make sure the node exists, creating it and any missing parents.
    ///
    /// Existence check and creation are not atomic: two launches using the
    /// same name may both try to create it, which `create_dir_all` tolerates.
    pub fn ensure(config: &CgroupConfig) -> Result<Self> {
        if !cgroups_available(&config.root) {
            return Err(ContainerError::Cgroup(format!(
                "{} is not a cgroup v2 hierarchy (no cgroup.controllers)",
                config.root.display()
            )));
        }

        let cgroup_path = config.path();

        if !cgroup_path.exists() {
            DirBuilder::new()
                .recursive(true)
                .mode(0o755)
                .create(&cgroup_path)
                .map_err(|e| {
                    ContainerError::Cgroup(format!(
                        "Failed to create cgroup directory {}: {}",
                        cgroup_path.display(),
                        e
                    ))
                })?;
            log::debug!("created cgroup {}", cgroup_path.display());
        }

        Ok(Self::open(config))
    }

    /// Handle to the node without touching the filesystem
    pub fn open(config: &CgroupConfig) -> Self {
        Self {
            name: config.name.clone(),
            cgroup_path: config.path(),
        }
    }

    /// Create-if-absent, set the ceiling, then move `pid` into the group.
    /// Any failure aborts; a process is never left running outside the limit.
    pub fn join(config: &CgroupConfig, pid: u32) -> Result<Self> {
        let cgroup = Self::ensure(config)?;
        cgroup.set_process_limit(config.pids_max)?;
        cgroup.add_process(pid)?;
        log::info!(
            "pid {} joined cgroup {} (pids.max={})",
            pid,
            cgroup.name,
            config.pids_max
        );
        Ok(cgroup)
    }

    pub fn set_process_limit(&self, limit: u32) -> Result<()> {
        self.write_cgroup_file("pids.max", &limit.to_string())
    }

    pub fn add_process(&self, pid: u32) -> Result<()> {
        self.write_cgroup_file("cgroup.procs", &pid.to_string())
    }

    /// Remove the node. The kernel refuses while processes are still in it.
    pub fn remove(&self) -> Result<()> {
        fs::remove_dir(&self.cgroup_path).map_err(|e| {
            ContainerError::Cgroup(format!(
                "Failed to remove cgroup {}: {}",
                self.cgroup_path.display(),
                e
            ))
        })?;
        log::debug!("removed cgroup {}", self.cgroup_path.display());
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.cgroup_path
    }

    fn write_cgroup_file(&self, filename: &str, content: &str) -> Result<()> {
        let file_path = self.cgroup_path.join(filename);
        fs::write(&file_path, content)
            .map_err(|e| ContainerError::Cgroup(format!("Failed to write {}: {}", filename, e)))
    }
}

/// Whether a cgroup v2 hierarchy is mounted at `root`
pub fn cgroups_available(root: &Path) -> bool {
    root.join("cgroup.controllers").exists()
}
