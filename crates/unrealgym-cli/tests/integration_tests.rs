use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("multi-agent environments over Unreal Engine"));
}

#[test]
fn test_cli_modes() {
    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.arg("modes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Observation modes:"))
        .stdout(predicate::str::contains("ColorMask"))
        .stdout(predicate::str::contains("6-float pose"));
}

#[test]
fn test_cli_spaces() {
    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.args(["spaces", "--players", "3", "--mode", "rgbd", "--width", "32", "--height", "24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Map FlexibleRoom (3 agents, Rgbd observations)"))
        .stdout(predicate::str::contains("player_2"))
        .stdout(predicate::str::contains("[24, 32, 4]"));
}

#[test]
fn test_cli_demo() {
    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.args(["demo", "--steps", "4", "--episode-length", "2", "--mode", "pose", "--action-type", "mixed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset: observation shape [2, 6]"))
        .stdout(predicate::str::contains("Episode boundary at step 2"))
        .stdout(predicate::str::contains("Step 2: collisions="));
}

#[test]
fn test_cli_demo_writes_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.jsonl");

    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.args(["demo", "--steps", "4", "--episode-length", "2", "--mode", "pose"])
        .arg("--metrics")
        .arg(&path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    // One record at the mid-run reset and one on close
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["episode"], 1);
    assert_eq!(records[0]["episode_length"], 2.0);
    assert!(records[1].get("episode_peak_collisions").is_some());
}

#[test]
fn test_cli_population() {
    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.args(["population", "--target", "5", "--mode", "depth", "--width", "16", "--height", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("After: 5 agents"))
        .stdout(predicate::str::contains("player_EP1_4"))
        .stdout(predicate::str::contains("Reset: observation shape [5, 16, 16, 1]"));
}

#[test]
fn test_cli_setting_file() {
    let setting = unrealgym_envs::demo_setting(1);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&setting).unwrap()).unwrap();

    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.arg("spaces")
        .arg("--setting")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("player_0"))
        .stdout(predicate::str::contains("(1 agents, Color observations)"));
}

#[test]
fn test_cli_rejects_gray() {
    let mut cmd = Command::cargo_bin("unrealgym").unwrap();
    cmd.args(["spaces", "--mode", "gray"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Gray observations are not supported"));
}
