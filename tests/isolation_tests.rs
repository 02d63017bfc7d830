/// End-to-end container tests.
///
/// These need root with CAP_SYS_ADMIN and a writable cgroup v2 hierarchy,
/// so they only run when LIZBOX_PRIVILEGED_TESTS=1.
use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

fn privileged() -> bool {
    if std::env::var("LIZBOX_PRIVILEGED_TESTS").as_deref() != Ok("1") {
        println!("Skipping container test - set LIZBOX_PRIVILEGED_TESTS=1 to run it");
        return false;
    }
    if !std::path::Path::new("/sys/fs/cgroup/cgroup.controllers").exists() {
        println!("Skipping container test - no cgroup v2 hierarchy at /sys/fs/cgroup");
        return false;
    }
    true
}

fn run(args: &[&str]) -> assert_cmd::assert::Assert {
    Command::cargo_bin("lizbox")
        .unwrap()
        .arg("run")
        .args(args)
        .assert()
}

#[test]
#[serial]
fn test_echo_output_passes_through() {
    if !privileged() {
        return;
    }
    run(&["echo", "hello"]).code(0).stdout("hello\n");
}

#[test]
#[serial]
fn test_exit_codes_are_propagated() {
    if !privileged() {
        return;
    }
    run(&["false"]).code(1).stdout(predicate::str::is_empty());
    run(&["sh", "-c", "exit 42"]).code(42);
}

#[test]
#[serial]
fn test_missing_target_is_setup_failure() {
    if !privileged() {
        return;
    }
    run(&["/nonexistent"])
        .code(1)
        .stderr(predicate::str::contains("Failed to start /nonexistent"));
}

#[test]
#[serial]
fn test_hostname_is_isolated() {
    if !privileged() {
        return;
    }
    let host = std::fs::read_to_string("/proc/sys/kernel/hostname").unwrap();

    run(&["cat", "/proc/sys/kernel/hostname"])
        .code(0)
        .stdout("container\n");

    assert_eq!(
        std::fs::read_to_string("/proc/sys/kernel/hostname").unwrap(),
        host
    );
}

#[test]
#[serial]
fn test_pid_namespace_hides_host_processes() {
    if !privileged() {
        return;
    }
    // The bootstrapper is pid 1, so the first target is pid 2
    run(&["sh", "-c", "echo $$"]).code(0).stdout("2\n");
    run(&["sh", "-c", "ls /proc | grep -c '^[0-9]'"])
        .code(0)
        .stdout(predicate::function(|out: &str| {
            out.trim().parse::<u32>().map(|n| n <= 5).unwrap_or(false)
        }));
}

#[test]
#[serial]
fn test_proc_mount_does_not_leak_to_host() {
    if !privileged() {
        return;
    }
    let before = std::fs::read_to_string("/proc/self/mountinfo").unwrap();
    run(&["true"]).code(0);
    let after = std::fs::read_to_string("/proc/self/mountinfo").unwrap();
    assert_eq!(before.lines().count(), after.lines().count());
}

#[test]
#[serial]
fn test_process_limit_is_enforced() {
    if !privileged() {
        return;
    }
    let started = tempfile::NamedTempFile::new().unwrap();
    let script = format!(
        "for i in $(seq 1 30); do (echo x >> {}; exec sleep 1) & done; wait",
        started.path().display()
    );
    run(&["sh", "-c", &script]).stderr(predicate::str::contains("fork"));

    // The bootstrapper and the shell count against the same limit of 20
    let spawned = std::fs::read_to_string(started.path())
        .unwrap()
        .lines()
        .count();
    assert!(spawned < 20, "{} children started", spawned);

    assert_eq!(
        std::fs::read_to_string("/sys/fs/cgroup/liz/pids.max")
            .unwrap()
            .trim(),
        "20"
    );
}

#[test]
#[serial]
fn test_unique_cgroup_is_removed() {
    if !privileged() {
        return;
    }
    run(&["--unique-cgroup", "--pids-max", "5", "cat", "/proc/self/cgroup"])
        .code(0)
        .stdout(predicate::str::contains("/liz-"));

    let leftovers = std::fs::read_dir("/sys/fs/cgroup")
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("liz-"))
        .count();
    assert_eq!(leftovers, 0);
}
