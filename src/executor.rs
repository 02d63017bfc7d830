/// Runs the user's target command with inherited stdio and an optional deadline
use crate::types::{ContainerError, Invocation, Result};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the target command ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetOutcome {
    pub status: ExitStatus,
    /// Killed because the deadline passed
    pub timed_out: bool,
}

impl TargetOutcome {
    pub fn exit_code(&self) -> i32 {
        exit_code(&self.status)
    }
}

/// Exit code a shell would report: the code itself, or 128 + signal
pub fn exit_code(status: &ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

/// Spawn the target and block until it exits.
///
/// `program` is resolved through `PATH`. A spawn failure is an error; a
/// non-zero exit is not.
pub fn run_target(invocation: &Invocation, timeout: Option<Duration>) -> Result<TargetOutcome> {
    let child = Command::new(invocation.program())
        .args(invocation.args())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| {
            ContainerError::Process(format!(
                "Failed to start {}: {}",
                invocation.program(),
                e
            ))
        })?;
    log::debug!("started {} as pid {}", invocation.program(), child.id());

    match timeout {
        Some(limit) => wait_with_timeout(child, limit),
        None => wait(child),
    }
}

fn wait(mut child: Child) -> Result<TargetOutcome> {
    let status = child
        .wait()
        .map_err(|e| ContainerError::Process(format!("Failed to wait for target: {}", e)))?;
    Ok(TargetOutcome {
        status,
        timed_out: false,
    })
}

fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<TargetOutcome> {
    let start_time = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(TargetOutcome {
                    status,
                    timed_out: false,
                })
            }
            Ok(None) => {
                if start_time.elapsed() >= timeout {
                    log::warn!(
                        "target pid {} exceeded {:?}, killing it",
                        child.id(),
                        timeout
                    );
                    // ESRCH here means it exited on its own; wait() reports either way
                    let _ = child.kill();
                    let status = child.wait().map_err(|e| {
                        ContainerError::Process(format!("Failed to reap target: {}", e))
                    })?;
                    return Ok(TargetOutcome {
                        status,
                        timed_out: true,
                    });
                }
            }
            Err(e) => {
                return Err(ContainerError::Process(format!(
                    "Process monitoring error: {}",
                    e
                )));
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}
