//! CLI tests for the `posarg explain` subcommand.

use std::process::Command;

use assert_cmd::cargo;

fn posarg_cmd() -> Command {
    Command::new(cargo::cargo_bin!("posarg"))
}

#[test]
fn explain_known_code_json_returns_explanation() {
    let output = posarg_cmd()
        .args(["explain", "PA1001", "--output", "json"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["id"], "PA1001");
    assert!(json["explanation"].is_string());
}

#[test]
fn explain_unknown_code_json_returns_null_explanation() {
    let output = posarg_cmd()
        .args(["explain", "PA9999", "--output", "json"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["id"], "PA9999");
    assert!(json["explanation"].is_null());
}

#[test]
fn explain_pretty_shows_human_readable_text() {
    let output = posarg_cmd()
        .args(["explain", "PA2002", "--output", "pretty"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("PA2002") && stdout.contains(':'),
        "unexpected output: {stdout}"
    );
}
