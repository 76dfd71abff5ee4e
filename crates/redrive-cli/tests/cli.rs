//! End-to-end tests of the `redrive` binary against the in-memory backend.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn redrive() -> Command {
    let mut cmd = Command::cargo_bin("redrive").unwrap();
    cmd.env_remove("REDRIVE_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn command_does_not_exist() {
    redrive()
        .arg("something")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: unrecognized subcommand"));
}

#[test]
fn help_lists_subcommands() {
    redrive().arg("--help").assert().success().stdout(
        predicate::str::contains("demo")
            .and(predicate::str::contains("drain"))
            .and(predicate::str::contains("extend")),
    );
}

#[test]
fn demo_runs_against_memory_backend() {
    redrive()
        .args(["--provider", "memory", "demo", "--purge"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""operation":"create_queue""#)
                .and(predicate::str::contains(r#""operation":"send_message_batch""#))
                .and(predicate::str::contains(r#""body":"This is my first SQS message!!! :D :D""#))
                .and(predicate::str::contains(r#""operation":"purge_queue""#))
                .and(predicate::str::contains(r#""operation":"delete_queues""#)),
        );
}

#[test]
fn config_prints_resolved_configuration() {
    redrive()
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""type": "in_memory""#)
                .and(predicate::str::contains(r#""failure_policy": "leave_in_flight""#)),
        );
}

#[test]
fn unknown_queue_exits_with_queue_error_code() {
    redrive()
        .args(["--provider", "memory", "arn", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn invalid_configuration_exits_with_configuration_error_code() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    writeln!(file, "lifecycle:\n  receive_wait_seconds: 99").unwrap();

    redrive()
        .arg("--config")
        .arg(file.path())
        .args(["arn", "orders"])
        .assert()
        .code(1);
}
