use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cargo_bin() -> &'static str {
    "uistream"
}

#[test]
fn cli_stdin_stdout_repairs_truncated_document() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    cmd.write_stdin(r#"{"id": "t1", "type": "text", "properties": {"text": "Hel"#)
        .assert()
        .success()
        .stdout(predicate::function(|out: &[u8]| {
            std::str::from_utf8(out)
                .ok()
                .and_then(|s| serde_json::from_str::<serde_json::Value>(s.trim()).ok())
                .is_some_and(|v| v["id"] == "t1")
        }));
}

#[test]
fn cli_valid_document_passes_through() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    cmd.write_stdin(r#"{"a": 1}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a":1}"#));
}

#[test]
fn cli_file_to_file_with_small_chunks() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("in.json");
    let out = dir.path().join("out.json");
    fs::write(&inp, r#"{"id": "x", "type": "card", "properties": {"n": [1, 2"#).unwrap();
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args([
            "--chunk-size",
            "8",
            inp.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();
    let s = fs::read_to_string(out).unwrap();
    let v: serde_json::Value = serde_json::from_str(s.trim()).unwrap();
    assert_eq!(v["properties"]["n"], serde_json::json!([1, 2]));
}

#[test]
fn cli_stats_reports_strategy_on_stderr() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    cmd.arg("--stats")
        .write_stdin(r#"{"a": [1, 2"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("recovered via"));
}

#[test]
fn cli_rejects_unknown_option() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    cmd.arg("--definitely-not-a-flag").assert().code(2);
}

#[test]
fn cli_no_salvage_fails_on_hopeless_input() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    cmd.arg("--no-salvage")
        .write_stdin(r#"{"x": "#)
        .assert()
        .failure();
}
