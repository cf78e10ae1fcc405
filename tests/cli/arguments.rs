//! Argument handling of the `testdeps` binary that needs no Docker daemon

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn testdeps() -> Result<Command> {
    Ok(Command::cargo_bin("testdeps")?)
}

#[test]
fn test_help_lists_backends() -> Result<()> {
    testdeps()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mongo"))
        .stdout(predicate::str::contains("nats"))
        .stdout(predicate::str::contains("postgres"));
    Ok(())
}

#[test]
fn test_postgres_help_lists_flags() -> Result<()> {
    testdeps()?
        .args(["postgres", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--password"))
        .stdout(predicate::str::contains("--trust"))
        .stdout(predicate::str::contains("--format"));
    Ok(())
}

#[test]
fn test_missing_subcommand_fails() -> Result<()> {
    testdeps()?.assert().failure();
    Ok(())
}

#[test]
fn test_root_password_requires_username() -> Result<()> {
    testdeps()?
        .args(["mongo", "--root-password", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--root-username"));
    Ok(())
}

#[test]
fn test_invalid_config_file_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let config_file = dir.path().join("testdeps.yaml");
    fs::write(&config_file, "connect_timeout_secs: [not, a, number]\n")?;

    testdeps()?
        .arg("--config-file")
        .arg(&config_file)
        .arg("nats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
    Ok(())
}

#[test]
fn test_zero_timeout_is_rejected() -> Result<()> {
    testdeps()?
        .args(["nats", "--timeout-secs", "0"])
        .env_remove("TESTDEPS_CONFIG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
    Ok(())
}
