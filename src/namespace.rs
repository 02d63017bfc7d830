/// Namespace isolation: the set requested at clone time and the
/// operations performed from inside the new namespaces
use crate::types::{ContainerError, Result};
use nix::mount::{mount, MsFlags};
use nix::sched::{unshare, CloneFlags};
use nix::unistd::sethostname;

/// Isolation domains requested for the container process
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamespaceSet {
    pub uts: bool,
    pub pid: bool,
    pub mount: bool,
    pub network: bool,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self {
            uts: true,
            pid: true,
            mount: true,
            network: true,
        }
    }
}

impl NamespaceSet {
    /// Flags handed to `clone(2)`
    pub fn clone_flags(&self) -> CloneFlags {
        let mut clone_flags = CloneFlags::empty();

        if self.uts {
            clone_flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.pid {
            clone_flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.mount {
            clone_flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.network {
            clone_flags |= CloneFlags::CLONE_NEWNET;
        }

        clone_flags
    }

    pub fn enabled_namespaces(&self) -> Vec<&'static str> {
        let mut namespaces = Vec::new();

        if self.uts {
            namespaces.push("UTS");
        }
        if self.pid {
            namespaces.push("PID");
        }
        if self.mount {
            namespaces.push("Mount");
        }
        if self.network {
            namespaces.push("Network");
        }

        namespaces
    }
}

/// Unshare the mount namespace again and stop mount propagation to the host.
///
/// A freshly cloned mount namespace still shares propagation peers with the
/// parent when `/` is a shared mount, so the procfs mounted later would leak
/// back. Runs in the cloned child before it re-execs.
pub fn make_mounts_private() -> Result<()> {
    unshare(CloneFlags::CLONE_NEWNS)
        .map_err(|e| ContainerError::Namespace(format!("Failed to unshare mount namespace: {}", e)))?;

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| {
        ContainerError::Namespace(format!("Failed to make root filesystem private: {}", e))
    })?;

    Ok(())
}

/// Set the hostname visible inside the current UTS namespace
pub fn set_hostname(hostname: &str) -> Result<()> {
    sethostname(hostname)
        .map_err(|e| ContainerError::Namespace(format!("Failed to set hostname: {}", e)))?;
    log::debug!("hostname set to {}", hostname);
    Ok(())
}

/// Check if namespace isolation is supported on this system
pub fn is_supported() -> bool {
    std::fs::read_dir("/proc/self/ns").is_ok()
}
