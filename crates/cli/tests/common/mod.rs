//! Shared helpers for `posarg` CLI tests.

#![allow(unreachable_pub, dead_code)]

use std::process::{Command, Output};

use assert_cmd::cargo;

pub fn posarg_cmd() -> Command {
    Command::new(cargo::cargo_bin!("posarg"))
}

/// Write `content` as `schema.json` in a fresh temp dir.
pub fn write_temp_schema(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("schema.json");
    std::fs::write(&path, content).expect("write schema");
    (dir, path.to_string_lossy().into_owned())
}

/// Parse stdout as JSON.
pub fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid json ({e}): {stdout}"))
}

/// `cp`-like schema: one or more sources, then a destination.
pub const COPY_SCHEMA: &str = r#"{
    "id": "cp",
    "schema_version": "1.0.0",
    "slots": [
        { "name": "sources", "kind": "list", "required": "1-4" },
        { "name": "dest", "kind": "scalar", "required": "1" }
    ]
}"#;

/// Typed schema with declared completion values.
pub const RESIZE_SCHEMA: &str = r#"{
    "id": "resize",
    "schema_version": "1.0.0",
    "slots": [
        { "name": "mode", "kind": "scalar", "required": "1",
          "complete": { "values": ["fit", "fill", "stretch"] } },
        { "name": "width", "kind": "scalar", "required": "1", "type": "int" },
        { "name": "keep", "kind": "scalar", "type": "bool" },
        { "name": "extra", "kind": "list", "required": "0-1" }
    ]
}"#;
