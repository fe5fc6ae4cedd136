//! Integration tests for the scanlink CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the developer's own config files and environment
fn scanlink(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scanlink").unwrap();
    cmd.current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .env_remove("RUST_LOG")
        .env_remove("SCANLINK_API__TOKEN");
    cmd
}

#[test]
fn test_cli_help() {
    // --help prints the long description
    let mut cmd = Command::cargo_bin("scanlink").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("splits them into bounded batches"));
}

#[test]
fn test_cli_short_help() {
    let mut cmd = Command::cargo_bin("scanlink").unwrap();
    cmd.arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batching client for remote code-scanning services"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("scanlink").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("scanlink"));
}

#[test]
fn test_invalid_subcommand() {
    let mut cmd = Command::cargo_bin("scanlink").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_unknown_scan_type_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    scanlink(&temp_dir)
        .args(["scan", "--scan-type", "bogus", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scan type 'bogus'"));
}

#[test]
fn test_scan_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("empty")).unwrap();

    scanlink(&temp_dir)
        .args(["scan", "empty", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No files to scan"));
}

#[test]
fn test_scan_reports_unreachable_service_per_batch() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.env"), "API_KEY=abc").unwrap();
    fs::write(temp_dir.path().join("b.py"), "print('hi')").unwrap();

    // One file per batch, both batches fail against a closed port
    scanlink(&temp_dir)
        .env("SCANLINK_API__BASE_URL", "http://127.0.0.1:9")
        .env("SCANLINK_SCAN_BATCH__MAX_FILES_COUNT", "1")
        .args(["scan", ".", "--no-progress", "--format", "json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"code\": \"transport\"").count(2))
        .stdout(predicate::str::contains("\"documents\": 2"));
}

#[test]
fn test_remediate_reports_unreachable_service() {
    let temp_dir = TempDir::new().unwrap();
    scanlink(&temp_dir)
        .env("SCANLINK_API__BASE_URL", "http://127.0.0.1:9")
        .args(["remediate", "det-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch remediation for detection det-1"));
}

#[test]
fn test_config_show_json() {
    let temp_dir = TempDir::new().unwrap();
    scanlink(&temp_dir)
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_parallel_scans"))
        .stdout(predicate::str::contains("\"sast\": 52428800"));
}

#[test]
fn test_config_show_custom_file_and_env() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(
        &config_path,
        "[scan_batch]\nmax_parallel_scans = 3\n\n[polling]\ninterval_ms = 250\n",
    )
    .unwrap();

    scanlink(&temp_dir)
        .env("SCANLINK_API__BASE_URL", "https://scanner.example.test")
        .args(["config", "show", "--format", "toml", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("max_parallel_scans = 3"))
        .stdout(predicate::str::contains("interval_ms = 250"))
        .stdout(predicate::str::contains("https://scanner.example.test"));
}

#[test]
fn test_config_show_never_prints_token() {
    let temp_dir = TempDir::new().unwrap();
    scanlink(&temp_dir)
        .env("SCANLINK_API__TOKEN", "tok-very-secret")
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tok-very-secret").not());
}

#[test]
fn test_config_show_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    scanlink(&temp_dir)
        .args(["config", "show", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}
