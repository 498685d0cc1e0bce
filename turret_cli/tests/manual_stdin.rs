use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[manual]
drive_power = 30
rotate_power = 5
burst_power = 90

[sim]
virtual_clock = true
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case("drive right\n", "drive 30")]
#[case("drive left\n", "drive -30")]
#[case("2 both\n", "burst -90")]
#[case("rotate right\n", "rotate 5")]
#[case("rotate both 3000\n", "charged_shot 100")]
#[case("rotate both 600\n", "charged_shot 80")]
#[case("9 left\n", "idle")]
#[case("drive none\n", "stopped")]
fn manual_lines_map_to_actions(#[case] input: &str, #[case] expected: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    Command::cargo_bin("turret")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--log-level")
        .arg("error")
        .arg("manual")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[rstest]
fn malformed_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    Command::cargo_bin("turret")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--log-level")
        .arg("error")
        .arg("manual")
        .write_stdin("hover left\n# comment\ndrive right\nquit\nrotate right\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("line 1"))
        .stdout(predicate::str::contains("drive 30"))
        .stdout(predicate::str::contains("rotate").not());
}

#[rstest]
fn manual_json_lines() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let out = Command::cargo_bin("turret")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("manual")
        .write_stdin("rotate left\ndrive none\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&out)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["action"], "rotate");
    assert_eq!(lines[0]["power"], -5);
    assert_eq!(lines[1]["action"], "stopped");
    assert!(lines[1]["power"].is_null());
}
