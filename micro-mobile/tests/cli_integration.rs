//! Integration tests for the micro-mobile binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos").join(name)
}

fn micro_mobile(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("micro-mobile").unwrap();
    cmd.env("MICRO_CONFIG", temp_dir.path().join("missing.toml"))
        .env_remove("MICRO_LOG_FORMAT")
        .env_remove("MICRO_LOG_LEVEL");
    cmd
}

#[test]
fn test_demo_session_json_report() {
    let temp_dir = TempDir::new().unwrap();

    let output = micro_mobile(&temp_dir)
        .arg(demo("mobile-session.json"))
        .arg("--fixtures")
        .arg(demo("fixtures.json"))
        .arg("--config")
        .arg(demo("config.toml"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let state = &report["state"];

    assert_eq!(state["user"]["user"]["name"], "Ada");
    assert_eq!(state["mobile"]["theme"], "dark");
    assert_eq!(state["tickets"]["items"][0]["status"], "closed");

    // The last step invalidated the User tag through the accessor
    let queries = state["mainApi"]["queries"].as_object().unwrap();
    assert_eq!(queries.len(), 1);
    assert!(state["mainApi"]["invalidated"]["User"].as_u64().is_some());

    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 8);
    assert_eq!(steps[3]["step"], "mutate paymentsApi/addTransaction");
    assert_eq!(steps[3]["result"]["status"], "fulfilled");
    assert_eq!(steps[4]["result"]["data"][0]["id"], "t-1");
}

#[test]
fn test_dispatch_step_updates_state() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("session.json");
    fs::write(
        &script,
        r#"[
            {
                "step": "dispatch",
                "action": {
                    "slice": "mobile",
                    "action": { "type": "setOnlineStatus", "payload": false }
                }
            },
            {
                "step": "dispatch",
                "action": {
                    "slice": "paymentSettings",
                    "action": { "type": "updateSettings", "payload": { "currency": "EUR" } }
                }
            }
        ]"#,
    )
    .unwrap();

    let output = micro_mobile(&temp_dir).arg(&script).args(["-f", "json"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["state"]["mobile"]["isOnline"], false);
    assert_eq!(report["state"]["paymentSettings"]["settings"]["currency"], "EUR");
}

#[test]
fn test_unknown_main_tag_exit_code() {
    let temp_dir = TempDir::new().unwrap();

    micro_mobile(&temp_dir)
        .write_stdin(r#"[{ "step": "invalidateMain", "tags": ["Wallet"] }]"#)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Wallet"));
}

#[test]
fn test_unknown_endpoint_exit_code() {
    let temp_dir = TempDir::new().unwrap();

    micro_mobile(&temp_dir)
        .write_stdin(r#"[{ "step": "query", "api": "paymentsApi", "endpoint": "getRefunds" }]"#)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("getRefunds"));
}

#[test]
fn test_invalid_log_format() {
    let temp_dir = TempDir::new().unwrap();

    micro_mobile(&temp_dir)
        .args(["--log-format", "xml"])
        .write_stdin("[]")
        .assert()
        .code(3);
}
