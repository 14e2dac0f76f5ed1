//! Integration tests for CLI argument handling
//!
//! Tests flag parsing and startup failures of the farewatch binary.

use std::process::Command;
use tempfile::TempDir;

/// Helper to run the CLI with given args in an empty directory and environment
fn run_cli(args: &[&str]) -> std::process::Output {
    let work_dir = TempDir::new().expect("Failed to create temp directory");
    run_cli_in(&work_dir, args)
}

/// Helper to run the CLI from `work_dir` with an empty environment
fn run_cli_in(work_dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_farewatch"))
        .args(args)
        .env_clear()
        .current_dir(work_dir.path())
        .output()
        .expect("Failed to execute farewatch")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("farewatch"), "Help should mention farewatch");
    assert!(stdout.contains("--dry-run"), "Help should mention --dry-run flag");
    assert!(stdout.contains("--origin"), "Help should mention --origin flag");
}

#[test]
fn test_invalid_origin_prints_error_and_exits() {
    let output = run_cli(&["--origin", "Sydney"]);
    assert!(!output.status.success(), "Expected invalid origin to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid code") || stderr.contains("invalid"),
        "Should print error message about invalid origin: {}",
        stderr
    );
}

#[test]
fn test_missing_configuration_exits_with_config_code() {
    let output = run_cli(&["--dry-run"]);
    assert_eq!(
        output.status.code(),
        Some(2),
        "Missing configuration should exit with code 2"
    );
    let logs = String::from_utf8_lossy(&output.stdout);
    assert!(
        logs.contains("SHEETY_PRICES_ENDPOINT"),
        "Should name the missing keys: {}",
        logs
    );
    assert!(!logs.contains("No .env file loaded"), "Debug output is off by default");
}

#[test]
fn test_log_filter_from_env_file_is_honoured() {
    let work_dir = TempDir::new().expect("Failed to create temp directory");
    std::fs::write(
        work_dir.path().join(".env"),
        "RUST_LOG=farewatch=debug\nSHEETY_PRICES_ENDPOINT=https://sheety.test/prices\n",
    )
    .expect("Failed to write .env");

    let output = run_cli_in(&work_dir, &["--dry-run"]);

    assert_eq!(output.status.code(), Some(2));
    let logs = String::from_utf8_lossy(&output.stdout);
    assert!(
        logs.contains("Loaded environment file"),
        "RUST_LOG from .env should enable debug output: {}",
        logs
    );
    assert!(
        !logs.contains("Missing required configuration: SHEETY_PRICES_ENDPOINT"),
        "Values from .env should be used: {}",
        logs
    );
}

#[test]
fn test_origin_with_help_is_valid() {
    let output = run_cli(&["--origin", "mel", "--help"]);
    assert!(output.status.success());
}
