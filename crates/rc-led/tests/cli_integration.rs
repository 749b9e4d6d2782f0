//! Integration tests for the `rc-led` binary.
//!
//! These tests exercise the CLI binary via `assert_cmd`. Everything that
//! touches the LED runs with `--dry-run` and a throwaway config file.

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("rc-led")
}

/// Command with `--config` pointing at `path`.
fn cli_with_config(path: &Path) -> assert_cmd::Command {
    let mut cmd = cli();
    cmd.arg("--config").arg(path);
    cmd
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rc-led"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_without_subcommand_fails() {
    cli().assert().failure();
}

// ── config ──

#[test]
fn cli_config_json_produces_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli_with_config(&dir.path().join("config.toml"))
        .args(["--json", "config"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert!(json["settings"].is_object());
    assert_eq!(json["config_file_exists"], false);
    assert_eq!(json["settings"]["mode"], "brake");
    assert_eq!(json["settings"]["blink_frequency"], 2.0);
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[test]
fn cli_config_reads_custom_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "mode = \"speed_zone\"\n[pins]\nred = 5\n").unwrap();

    cli_with_config(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(loaded)"))
        .stdout(predicate::str::contains("speed_zone"))
        .stdout(predicate::str::contains("pins.red:"));
}

#[test]
fn cli_config_reports_problems() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "blink_frequency = 0.0\n").unwrap();

    cli_with_config(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Problems:"))
        .stdout(predicate::str::contains("Invalid blink_frequency"));
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    let dir = tempfile::tempdir().unwrap();
    cli_with_config(&dir.path().join("config.toml"))
        .args(["-vv", "config"])
        .assert()
        .success();
}

// ── decide ──

#[test]
fn cli_decide_brake_band() {
    cli()
        .args(["decide", "--mode", "brake", "--drive-mode", "pilot", "--throttle", "-0.6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#FF0000 (red)"));
}

#[test]
fn cli_decide_speed_zone() {
    cli()
        .args([
            "decide",
            "--mode",
            "speed_zone",
            "--drive-mode",
            "pilot",
            "--speed-zone",
            "normal",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("#FFFF00 (yellow)"));
}

#[test]
fn cli_decide_invalid_drive_mode_is_black() {
    cli()
        .args(["decide", "--mode", "brake", "--drive-mode", "invalid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#000000 (black)"));
}

#[test]
fn cli_decide_json() {
    let output = cli()
        .args([
            "--json",
            "decide",
            "--mode",
            "brake",
            "--drive-mode",
            "user",
            "--throttle=-1.0",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["color"], "#FF00FF");
    assert_eq!(json["name"], "purple");
    assert_eq!(json["drive_mode"], "user");
}

#[test]
fn cli_decide_rejects_unknown_mode() {
    cli()
        .args(["decide", "--mode", "rainbow", "--drive-mode", "user"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rainbow"));
}

// ── check ──

#[test]
fn cli_check_dry_run_ends_black() {
    let dir = tempfile::tempdir().unwrap();
    cli_with_config(&dir.path().join("config.toml"))
        .args(["check", "--dry-run", "--delay", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#FF00FF"))
        .stdout(predicate::str::contains("black"));
}

#[test]
fn cli_check_rejects_negative_delay() {
    let dir = tempfile::tempdir().unwrap();
    cli_with_config(&dir.path().join("config.toml"))
        .args(["check", "--dry-run", "--delay=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ── run ──

#[test]
fn cli_run_dry_run_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.txt");
    std::fs::write(
        &events,
        "drive_mode user\nthrottle -0.6\nrecord on\nrecord off\n",
    )
    .unwrap();

    cli_with_config(&dir.path().join("config.toml"))
        .arg("run")
        .arg("--dry-run")
        .arg("--exit-on-eof")
        .arg("--events")
        .arg(&events)
        .assert()
        .success()
        .stdout(predicate::str::contains("[driver] dry-run"))
        .stdout(predicate::str::contains("indicator off"))
        .stdout(predicate::str::contains("user"));
}

#[test]
fn cli_run_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    cli_with_config(&dir.path().join("config.toml"))
        .args(["run", "--dry-run", "--exit-on-eof", "--mode", "speed_zone"])
        .write_stdin("drive_mode pilot\nspeed_zone fast\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("speed_zone"))
        .stdout(predicate::str::contains("fast"));
}

#[test]
fn cli_run_missing_events_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cli_with_config(&dir.path().join("config.toml"))
        .arg("run")
        .arg("--dry-run")
        .arg("--events")
        .arg(dir.path().join("absent.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn cli_run_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[pins]\nred = 4\ngreen = 4\n").unwrap();

    cli_with_config(&path)
        .args(["run", "--dry-run", "--exit-on-eof"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than one channel"));
}

#[test]
fn cli_check_single_color() {
    let dir = tempfile::tempdir().unwrap();
    cli_with_config(&dir.path().join("config.toml"))
        .args(["check", "--dry-run", "--delay", "0", "--color", "#102030"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom"))
        .stdout(predicate::str::contains("#102030"))
        .stdout(predicate::str::contains("#FF0000").not());
}
