//! End-to-end runs of the `gitread` binary.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;

fn gitread() -> Command {
    Command::cargo_bin("gitread").expect("binary builds")
}

#[test]
fn streams_stdout_and_succeeds() {
    gitread()
        .args(["--git", "sh", "--", "-c", "printf hello"])
        .assert()
        .success()
        .stdout("hello");
}

#[test]
fn propagates_the_child_exit_code() {
    gitread()
        .args(["--git", "sh", "--", "-c", "echo 'fatal: nope' >&2; exit 3"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("fatal: nope"));
}

#[test]
fn missing_program_exits_127() {
    gitread()
        .args(["--git", "gitread-no-such-binary-480f", "--", "status"])
        .assert()
        .code(127)
        .stderr(predicate::str::contains("PATH"));
}

#[test]
fn requires_git_arguments() {
    gitread().assert().failure();
}

#[test]
fn runs_inside_the_requested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    gitread()
        .args(["-C", dir.path().to_str().unwrap(), "--git", "sh", "--", "-c", "pwd"])
        .assert()
        .success()
        .stdout(predicate::str::contains(marker));
}
