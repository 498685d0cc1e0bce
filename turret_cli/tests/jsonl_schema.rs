use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, jammed: bool) -> PathBuf {
    let toml = format!(
        r#"
[sim]
virtual_clock = true
jammed = {jammed}
targets = [[40.0, 55.0, 30.0], [120.0, 130.0, 25.0]]
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| l.trim_start().starts_with('{'))
        .map(|l| serde_json::from_str(l).expect("valid JSON"))
        .collect()
}

/// Validate the JSONL schema for a successful cycle.
#[rstest]
fn jsonl_success_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, false);

    let mut cmd = Command::cargo_bin("turret").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("auto");

    let out = cmd.assert().success().get_output().stdout.clone();
    let lines = json_lines(&out);
    let v = lines
        .iter()
        .find(|v| v.get("target_count").is_some())
        .expect("result line");

    assert!(v.get("timestamp").and_then(|x| x.as_i64()).is_some());
    assert!(v.get("duration_ms").and_then(|x| x.as_u64()).is_some());
    assert_eq!(v["backend"], "sim");
    assert_eq!(v["target_count"], 2);
    assert_eq!(v["targets"].as_array().map(Vec::len), Some(2));
    assert!(v["gaps_closed"].as_u64().is_some());
    assert!(v["samples"].as_u64().unwrap() > 0);
    assert!(v["threshold_cm"].as_f64().is_some());
    assert!(v.get("buffer").is_none());

    // Abort reason must be null on success
    assert!(v.get("abort_reason").is_some());
    assert!(v["abort_reason"].is_null());
}

#[rstest]
fn jsonl_dump_includes_every_degree() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, false);

    let mut cmd = Command::cargo_bin("turret").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("auto")
        .arg("--dump");

    let out = cmd.assert().success().get_output().stdout.clone();
    let lines = json_lines(&out);
    let v = lines
        .iter()
        .find(|v| v.get("buffer").is_some())
        .expect("result line with buffer");
    let buffer = v["buffer"].as_array().unwrap();
    assert_eq!(buffer.len(), 181);
    let marked: Vec<u64> = buffer
        .iter()
        .filter(|s| s["target"] == true)
        .map(|s| s["angle"].as_u64().unwrap())
        .collect();
    let targets: Vec<u64> = v["targets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_u64().unwrap())
        .collect();
    assert_eq!(marked, targets);
    for s in buffer {
        if s["target"] == true {
            assert_eq!(s["detected"], true);
        }
    }
}

/// A jammed turret stalls the sweep: result line with abort_reason, then the error object.
#[rstest]
fn jsonl_abort_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, true);

    let mut cmd = Command::cargo_bin("turret").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("auto");

    let out = cmd.assert().code(4).get_output().stdout.clone();
    let lines = json_lines(&out);

    let result = lines
        .iter()
        .find(|v| v.get("abort_reason").is_some())
        .expect("result line");
    assert_eq!(result["abort_reason"], "SweepStall");
    assert!(result["target_count"].is_null());

    let err = lines
        .iter()
        .find(|v| v.get("reason").is_some())
        .expect("error line");
    assert_eq!(err["reason"], "SweepStall");
    assert_eq!(err["details"]["motion"], "sweep");
    assert_eq!(err["details"]["timeout_ms"], 60000);
    assert!(err["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[rstest]
fn jsonl_self_check() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, false);

    let mut cmd = Command::cargo_bin("turret").unwrap();
    cmd.arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check");

    let out = cmd.assert().success().get_output().stdout.clone();
    let lines = json_lines(&out);
    let v = lines.iter().find(|v| v.get("ok").is_some()).expect("status line");
    assert_eq!(v["ok"], true);
    assert_eq!(v["backend"], "sim");
    assert!(v["range_cm"].as_f64().is_some());
}
