/// Root transition and the container's private procfs
use crate::types::{ContainerError, Result};
use nix::mount::{mount, umount, MsFlags};
use nix::unistd::{chdir, chroot};
use std::fs;
use std::path::{Path, PathBuf};

/// Make `rootfs` the process root and move into it
pub fn enter_root(rootfs: &Path) -> Result<()> {
    chroot(rootfs).map_err(|e| {
        ContainerError::Filesystem(format!("chroot to {} failed: {}", rootfs.display(), e))
    })?;
    chdir("/").map_err(|e| ContainerError::Filesystem(format!("chdir to / failed: {}", e)))?;
    log::debug!("root changed to {}", rootfs.display());
    Ok(())
}

/// A procfs mount that is unmounted when dropped.
///
/// Must be mounted from a process that already lives in the new PID
/// namespace, otherwise the listing shows the host's processes.
#[derive(Debug)]
pub struct ProcMount {
    target: PathBuf,
    mounted: bool,
}

impl ProcMount {
    pub fn mount(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();

        if !target.exists() {
            fs::create_dir_all(&target).map_err(|e| {
                ContainerError::Filesystem(format!(
                    "Failed to create {}: {}",
                    target.display(),
                    e
                ))
            })?;
        }

        mount(
            Some("proc"),
            &target,
            Some("proc"),
            MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_NOEXEC,
            None::<&str>,
        )
        .map_err(|e| {
            ContainerError::Filesystem(format!("Failed to mount {}: {}", target.display(), e))
        })?;
        log::debug!("mounted proc at {}", target.display());

        Ok(Self {
            target,
            mounted: true,
        })
    }

    /// Unmount now and report the result instead of leaving it to `Drop`
    pub fn unmount(mut self) -> Result<()> {
        self.mounted = false;
        umount(&self.target).map_err(|e| {
            ContainerError::Filesystem(format!("Failed to unmount {}: {}", self.target.display(), e))
        })?;
        log::debug!("unmounted {}", self.target.display());
        Ok(())
    }
}

impl Drop for ProcMount {
    fn drop(&mut self) {
        if self.mounted {
            if let Err(e) = umount(&self.target) {
                log::warn!("Failed to unmount {}: {}", self.target.display(), e);
            }
        }
    }
}
