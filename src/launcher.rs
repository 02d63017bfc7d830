/// Outer stage: re-executes this binary inside new namespaces and reports
/// the container's exit status
use crate::cgroup::Cgroup;
use crate::namespace::{self, NamespaceSet};
use crate::types::{ContainerConfig, ContainerError, Invocation, Result, SETUP_FAILURE_EXIT_CODE};
use nix::errno::Errno;
use nix::sched::{clone, CloneCb};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execv, Pid};
use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStrExt;

/// Image of the running binary; exec'ing it needs no PATH lookup and
/// survives the binary being moved
pub const SELF_EXE: &str = "/proc/self/exe";
/// Action marker selecting the bootstrapper
pub const CHILD_ACTION: &str = "child";

const CHILD_STACK_SIZE: usize = 1024 * 1024;

pub struct Launcher {
    config: ContainerConfig,
    invocation: Invocation,
    namespaces: NamespaceSet,
    remove_cgroup_on_exit: bool,
}

impl Launcher {
    pub fn new(config: ContainerConfig, invocation: Invocation) -> Self {
        Self {
            config,
            invocation,
            namespaces: NamespaceSet::default(),
            remove_cgroup_on_exit: false,
        }
    }

    /// Give this launch its own cgroup node and remove it once the
    /// container has exited
    pub fn with_unique_cgroup(mut self) -> Self {
        self.config.cgroup = self.config.cgroup.with_unique_name();
        self.remove_cgroup_on_exit = true;
        self
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Arguments for the re-exec: the action marker, the resolved
    /// configuration, then the user's tokens unchanged
    pub fn child_args(&self) -> Vec<OsString> {
        let config = &self.config;
        let mut args: Vec<OsString> = vec![
            CHILD_ACTION.into(),
            "--hostname".into(),
            config.hostname.clone().into(),
            "--rootfs".into(),
            config.rootfs.clone().into(),
            "--cgroup-root".into(),
            config.cgroup.root.clone().into(),
            "--cgroup-name".into(),
            config.cgroup.name.clone().into(),
            "--pids-max".into(),
            config.cgroup.pids_max.to_string().into(),
        ];
        if let Some(timeout) = config.timeout_secs {
            args.push("--timeout".into());
            args.push(timeout.to_string().into());
        }
        args.push("--".into());
        args.extend(self.invocation.tokens().iter().map(OsString::from));
        args
    }

    /// Start the container and block until it exits; returns its exit code
    pub fn launch(&self) -> Result<i32> {
        log::info!(
            "Running {:?} as {} with namespaces {:?}",
            self.invocation.tokens(),
            std::process::id(),
            self.namespaces.enabled_namespaces()
        );
        if let Ok(json) = serde_json::to_string(&self.config) {
            log::debug!("container config: {}", json);
        }

        let path = to_cstring(SELF_EXE)?;
        let mut argv = vec![path.clone()];
        for arg in self.child_args() {
            argv.push(to_cstring(arg.as_bytes())?);
        }

        let privatize_mounts = self.namespaces.mount;
        let callback: CloneCb<'_> = Box::new(|| {
            if privatize_mounts {
                if let Err(e) = namespace::make_mounts_private() {
                    eprintln!("Error: {}", e);
                    return SETUP_FAILURE_EXIT_CODE as isize;
                }
            }
            let Err(e) = execv(&path, &argv);
            eprintln!("Error: failed to re-exec {}: {}", SELF_EXE, e);
            SETUP_FAILURE_EXIT_CODE as isize
        });

        let mut stack = vec![0u8; CHILD_STACK_SIZE];
        // SAFETY: without CLONE_VM the child runs on a private copy of this
        // address space and only re-execs or returns.
        let pid = unsafe {
            clone(
                callback,
                &mut stack,
                self.namespaces.clone_flags(),
                Some(libc::SIGCHLD),
            )
        }
        .map_err(|e| ContainerError::Namespace(format!("Failed to create container process: {}", e)))?;
        log::debug!("container process started as pid {}", pid);

        let code = wait_for_child(pid);

        if self.remove_cgroup_on_exit {
            if let Err(e) = Cgroup::open(&self.config.cgroup).remove() {
                log::warn!("{}", e);
            }
        }

        code
    }
}

fn to_cstring(bytes: impl Into<Vec<u8>>) -> Result<CString> {
    CString::new(bytes)
        .map_err(|e| ContainerError::Usage(format!("argument contains a NUL byte: {}", e)))
}

fn wait_for_child(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => {
                return Err(ContainerError::Process(format!(
                    "Failed to wait for container process: {}",
                    e
                )))
            }
        }
    }
}
