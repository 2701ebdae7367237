// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use assert_cmd::Command;
use predicates::prelude::*;

fn roicopy() -> Command {
    let mut cmd = Command::cargo_bin("roicopy").unwrap();
    cmd.env_remove("ROICOPY_SOURCE_SERVER")
        .env_remove("ROICOPY_SOURCE_USERNAME")
        .env_remove("ROICOPY_SOURCE_PASSWORD")
        .env_remove("ROICOPY_SERVER_ID");
    cmd
}

#[test]
fn test_help() {
    roicopy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dataset:<id>"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_missing_arguments() {
    roicopy()
        .args(["user", "pass"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_invalid_source_locator() {
    roicopy()
        .args(["user", "pass", "localhost", "Project:1", "Image:2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AmbiguousLocatorError"));
}

#[test]
fn test_invalid_target_id() {
    roicopy()
        .args(["user", "pass", "localhost", "Image:1", "Image:two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid id"));
}

#[test]
fn test_zero_stride() {
    roicopy()
        .args(["user", "pass", "localhost", "Image:1", "Image:2", "--stride", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--stride"));
}

#[test]
fn test_missing_source_credentials() {
    roicopy()
        .args(["user", "pass", "localhost", "Dataset:1", "Dataset:2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ROICOPY_SOURCE_SERVER"));
}

#[test]
fn test_unreachable_source_server() {
    roicopy()
        .env("ROICOPY_SOURCE_SERVER", "http://127.0.0.1:9")
        .env("ROICOPY_SOURCE_USERNAME", "user")
        .env("ROICOPY_SOURCE_PASSWORD", "pass")
        .args(["user", "pass", "http://127.0.0.1:9", "Image:1", "Image:2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RemoteOperationError"));
}
