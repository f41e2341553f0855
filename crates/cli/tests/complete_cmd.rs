//! CLI tests for the `posarg complete` and `posarg table` subcommands.

mod common;

use common::{COPY_SCHEMA, RESIZE_SCHEMA, posarg_cmd, stdout_json, write_temp_schema};

#[test]
fn complete_offers_declared_values_first() {
    let (_dir, schema) = write_temp_schema(RESIZE_SCHEMA);
    let output = posarg_cmd()
        .args(["complete", "--schema", &schema, "--output", "json"])
        .output()
        .expect("run complete");

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["eligible"], serde_json::json!(["mode"]));
    assert_eq!(
        json["candidates"],
        serde_json::json!(["fill", "fit", "stretch"])
    );
}

#[test]
fn complete_filters_by_current_word() {
    let (_dir, schema) = write_temp_schema(RESIZE_SCHEMA);
    let output = posarg_cmd()
        .args(["complete", "--schema", &schema, "--current", "fi", "--output", "pretty"])
        .output()
        .expect("run complete");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["fill", "fit"]);
}

#[test]
fn complete_uses_type_sources_for_later_slots() {
    let (_dir, schema) = write_temp_schema(RESIZE_SCHEMA);
    for extra in [&[][..], &["--sequential"][..]] {
        let output = posarg_cmd()
            .args(["complete", "--schema", &schema, "--output", "json"])
            .args(extra)
            .args(["--", "fit", "100"])
            .output()
            .expect("run complete");

        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["eligible"], serde_json::json!(["keep", "extra"]));
        assert_eq!(json["candidates"], serde_json::json!(["false", "true"]));
    }
}

#[test]
fn complete_with_no_eligible_slot_is_empty() {
    let (_dir, schema) = write_temp_schema(COPY_SCHEMA);
    let output = posarg_cmd()
        .args(["complete", "--schema", &schema, "--output", "json", "--"])
        .args(["a", "b", "c", "d", "e"])
        .output()
        .expect("run complete");

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["candidates"], serde_json::json!([]));
}

#[test]
fn table_json_lists_cumulative_bounds() {
    let (_dir, schema) = write_temp_schema(COPY_SCHEMA);
    let output = posarg_cmd()
        .args(["table", "--schema", &schema, "--output", "json"])
        .output()
        .expect("run table");

    assert!(output.status.success());
    let json = stdout_json(&output);
    let dest = &json["slots"][1];
    assert_eq!(dest["name"], "dest");
    assert_eq!(dest["start_min"], 1);
    assert_eq!(dest["start_max"], 4);
    assert_eq!(json["total_min"], 2);
    assert_eq!(json["total_max"], 5);
}

#[test]
fn table_pretty_marks_unbounded_maximum() {
    let (_dir, schema) = write_temp_schema(
        r#"{ "id": "ls", "schema_version": "1", "slots": [
            { "name": "paths", "kind": "list" } ] }"#,
    );
    let output = posarg_cmd()
        .args(["table", "--schema", &schema, "--output", "pretty"])
        .output()
        .expect("run table");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("paths"), "stdout: {stdout}");
    assert!(stdout.contains("total: 0..*"), "stdout: {stdout}");
}
