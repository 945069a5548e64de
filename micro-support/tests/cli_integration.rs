//! Integration tests for the micro-support binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos").join(name)
}

/// Command with no user config and quiet logs
fn micro_support(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("micro-support").unwrap();
    cmd.env("MICRO_CONFIG", temp_dir.path().join("missing.toml"))
        .env_remove("MICRO_LOG_FORMAT")
        .env_remove("MICRO_LOG_LEVEL");
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("micro-support")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_demo_session_json_report() {
    let temp_dir = TempDir::new().unwrap();

    let output = micro_support(&temp_dir)
        .arg(demo("support-session.json"))
        .arg("--fixtures")
        .arg(demo("fixtures.json"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0]["result"]["status"], "fulfilled");
    assert_eq!(steps[1]["result"]["status"], "fulfilled");
    assert_eq!(steps[2]["result"]["status"], "fulfilled");

    let items = report["state"]["tickets"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "1");
    assert_eq!(items[0]["status"], "closed");
    assert_eq!(items[1]["title"], "Card declined");

    // Standalone: no main app slices at all
    assert!(report["state"].get("user").is_none());
    assert!(report["state"].get("mainApi").is_none());
    assert!(report["state"]["supportApi"]["queries"].is_object());
}

#[test]
fn test_script_from_stdin_text_report() {
    let temp_dir = TempDir::new().unwrap();

    micro_support(&temp_dir)
        .arg("--fixtures")
        .arg(demo("fixtures.json"))
        .write_stdin(r#"[{ "step": "query", "api": "supportApi", "endpoint": "getTickets" }]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] query supportApi/getTickets: fulfilled"))
        .stdout(predicate::str::contains("\"Test Ticket\""));
}

#[test]
fn test_without_fixtures_requests_are_rejected() {
    let temp_dir = TempDir::new().unwrap();

    micro_support(&temp_dir)
        .write_stdin(r#"[{ "step": "query", "api": "supportApi", "endpoint": "getTickets" }]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected (No route for GET /api/support/tickets)"))
        .stdout(predicate::str::contains("Failed to fetch tickets"));
}

#[test]
fn test_unknown_api_exit_code() {
    let temp_dir = TempDir::new().unwrap();

    micro_support(&temp_dir)
        .write_stdin(r#"[{ "step": "query", "api": "mainApi", "endpoint": "getCurrentUser" }]"#)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown API 'mainApi'"));
}

#[test]
fn test_invalid_script_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("broken.json");
    fs::write(&script, r#"{ "step": "query" }"#).unwrap();

    micro_support(&temp_dir)
        .arg(&script)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid script"));
}

#[test]
fn test_bad_config_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[api]\nrequest_timeout = \"soon\"\n").unwrap();

    micro_support(&temp_dir)
        .arg("--config")
        .arg(&config)
        .write_stdin("[]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid duration for api.request_timeout"));
}
