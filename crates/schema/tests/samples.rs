//! Every schema under `schemas/` loads and resolves to a table.

use std::fs;
use std::path::Path;

use posarg_core::Bound;
use posarg_schema::{SourceOrigin, load_schema_from_str};

fn schemas_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schemas")
}

fn load(name: &str) -> posarg_schema::Schema {
    let path = schemas_dir().join(name);
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    load_schema_from_str(&text).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[test]
fn all_sample_schemas_load() {
    let mut seen = 0;
    for entry in fs::read_dir(schemas_dir()).expect("schemas dir") {
        let path = entry.expect("dir entry").path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let schema = load(&name);
        assert!(schema.slot_table().is_ok(), "{name}");
        seen += 1;
    }
    assert!(seen >= 3, "expected sample schemas, found {seen}");
}

#[test]
fn copy_schema_reserves_destination() {
    let t = load("cp.json").slot_table().unwrap();
    assert_eq!(t.total_min(), 2);
    assert_eq!(t.total_max(), Some(17));
    assert_eq!(t.slots()[1].start_max, 16);
}

#[test]
fn git_tag_schema_pins_tag_and_disables_legacy() {
    let t = load("git-tag.json").slot_table().unwrap();
    assert_eq!(t.slots()[0].minimum, 1);
    assert_eq!(t.slots()[1].minimum, 0);
    assert!(t.slots()[2].is_disabled());
    assert_eq!(t.slots()[2].maximum, Bound::Exactly(0));
}

#[test]
fn resize_schema_declares_image_source_over_path_type() {
    let s = load("resize.json");
    let images: Vec<_> = s
        .sources()
        .into_iter()
        .filter(|src| src.index == 4)
        .map(|src| src.origin)
        .collect();
    assert_eq!(images, vec![SourceOrigin::Declared, SourceOrigin::Type]);
}
