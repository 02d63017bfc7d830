/// Inner stage: runs as pid 1 of the new namespaces, builds the container
/// environment, runs the target and cleans up after it
use crate::cgroup::Cgroup;
use crate::executor::{self, TargetOutcome};
use crate::filesystem::{self, ProcMount};
use crate::namespace;
use crate::types::{ContainerConfig, Invocation, Result, PROC_MOUNT_POINT};

pub struct Bootstrapper {
    config: ContainerConfig,
    invocation: Invocation,
}

impl Bootstrapper {
    pub fn new(config: ContainerConfig, invocation: Invocation) -> Self {
        Self { config, invocation }
    }

    /// Set up the container and run the target; returns the target's exit code.
    ///
    /// The steps run in a fixed order. The cgroup is joined first so that
    /// nothing started later can escape the process limit, and `/proc` is
    /// mounted after the root change so it lands inside the new root.
    pub fn run(&self) -> Result<i32> {
        log::info!(
            "Running {:?} as {}",
            self.invocation.tokens(),
            std::process::id()
        );

        Cgroup::join(&self.config.cgroup, std::process::id())?;
        namespace::set_hostname(&self.config.hostname)?;
        filesystem::enter_root(&self.config.rootfs)?;
        let proc_mount = ProcMount::mount(PROC_MOUNT_POINT)?;

        let outcome = executor::run_target(&self.invocation, self.config.timeout());

        // Unmount on every path, including a target that never started
        let unmounted = proc_mount.unmount();
        let outcome = outcome?;
        unmounted?;

        Ok(self.report(outcome))
    }

    fn report(&self, outcome: TargetOutcome) -> i32 {
        let code = outcome.exit_code();
        if outcome.timed_out {
            log::warn!(
                "{} killed after {}s",
                self.invocation.program(),
                self.config.timeout_secs.unwrap_or_default()
            );
        } else {
            log::info!("{} exited with {}", self.invocation.program(), code);
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CgroupConfig, ContainerError};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cgroup_failure_stops_before_target() {
        let dir = TempDir::new().unwrap();
        let not_a_hierarchy = dir.path().join("cgroup-root");
        fs::write(&not_a_hierarchy, "").unwrap();
        let marker = dir.path().join("target-ran");

        let config = ContainerConfig {
            hostname: "must-not-be-set".to_string(),
            cgroup: CgroupConfig {
                root: not_a_hierarchy,
                ..CgroupConfig::default()
            },
            ..ContainerConfig::default()
        };
        let invocation = Invocation::from_tokens(vec![
            "touch".to_string(),
            marker.display().to_string(),
        ])
        .unwrap();

        let err = Bootstrapper::new(config, invocation).run().unwrap_err();
        assert!(matches!(err, ContainerError::Cgroup(_)));
        assert!(!marker.exists());
    }
}
