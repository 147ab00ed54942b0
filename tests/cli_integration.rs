//! Integration tests for the command-line interface.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const HEADER: &str =
    "filename,filepath,category,confidence,start_time_ms,end_time_ms,freq_min,freq_max";

/// Command with an empty config file so the user's configuration is ignored.
fn batcallr(tmp: &Path) -> Command {
    let config = tmp.join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::new(cargo_bin("batcallr"));
    cmd.arg("--config")
        .arg(&config)
        .env_remove("BATCALLR_MODEL")
        .env_remove("BATCALLR_LABELS")
        .env_remove("RUST_LOG");
    cmd
}

fn write_detections(path: &PathBuf) {
    let rows = [
        HEADER,
        "a.wav,/d/a.wav,Buzz,0.5,0,1000,20000,60000",
        "a.wav,/d/a.wav,Buzz,0.9,10,1005,21000,61000",
        "a.wav,/d/a.wav,Buzz,0.7,5000,6000,20000,60000",
        "a.wav,/d/a.wav,Other,0.99,0,1000,0,120000",
    ];
    std::fs::write(path, rows.join("\n") + "\n").unwrap();
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tidy"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_prints_explicit_file() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_prints_defaults() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"))
        .stdout(predicate::str::contains("files_per_batch = 10000"));
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("config.toml"), "[defaults]\noverlap = 5.0\n").unwrap();
    batcallr(tmp.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_tidy_writes_merged_rows() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("output_1-1.csv");
    write_detections(&input);

    batcallr(tmp.path())
        .arg("tidy")
        .arg(&input)
        .args(["-t", "20"])
        .assert()
        .success();

    let tidied = std::fs::read_to_string(tmp.path().join("output_1-1_tidy.csv")).unwrap();
    let lines: Vec<_> = tidied.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",0.9,10,1005,"));
    assert!(lines[2].contains(",0.7,5000,6000,"));
    assert!(!tidied.contains("Other"));
}

#[test]
fn test_tidy_explicit_output() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("night.csv");
    let output = tmp.path().join("clean.csv");
    write_detections(&input);

    batcallr(tmp.path())
        .arg("tidy")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
    assert!(!tmp.path().join("night_tidy.csv").exists());
}

#[test]
fn test_tidy_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .args(["tidy", "/nonexistent/output_1-1.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_no_inputs_fails() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input directories"));
}

#[test]
fn test_negative_overlap_rejected() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .arg(tmp.path())
        .args(["--overlap", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_overlap_not_below_duration_rejected() {
    let tmp = TempDir::new().unwrap();
    batcallr(tmp.path())
        .arg(tmp.path())
        .args(["--overlap", "1.0", "--segment-duration", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_analysis_without_model_fails() {
    let tmp = TempDir::new().unwrap();
    let site = tmp.path().join("site");
    std::fs::create_dir_all(&site).unwrap();
    std::fs::write(site.join("rec.wav"), b"RIFF").unwrap();

    batcallr(tmp.path())
        .arg(&site)
        .arg("--no-progress")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));

    assert!(!site.join("output_1-1.csv").exists());
}
