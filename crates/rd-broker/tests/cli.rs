//! CLI smoke tests for the broker binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rd_broker() -> Command {
    Command::cargo_bin("rd-broker")
        .expect("Failed to locate rd-broker binary - ensure it's built before running tests")
}

#[test]
fn test_broker_help() {
    rd_broker()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rdesk signaling broker"))
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_broker_version() {
    rd_broker()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rd-broker"));
}

#[test]
fn test_broker_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    rd_broker()
        .arg("--config")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_broker_rejects_invalid_accounts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broker.toml");
    std::fs::write(
        &path,
        r#"
bind_address = "127.0.0.1:0"

[[accounts]]
identifier = "admin"
secret = "x"
"#,
    )
    .unwrap();

    rd_broker()
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid broker configuration"));
}
