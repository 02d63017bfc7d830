/// Command line behaviour that needs no privileges
use assert_cmd::Command;
use predicates::prelude::*;

fn lizbox() -> Command {
    Command::cargo_bin("lizbox").unwrap()
}

#[test]
fn test_missing_action_is_usage_error() {
    lizbox()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_action_is_usage_error() {
    lizbox()
        .args(["bogus", "echo", "hello"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn test_run_without_command_is_usage_error() {
    lizbox()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("COMMAND"));
}

#[test]
fn test_help_lists_run_but_not_child() {
    lizbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("child").not());
}

#[test]
fn test_unreadable_config_file_fails_setup() {
    lizbox()
        .args(["run", "--config", "/nonexistent/lizbox.json", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
