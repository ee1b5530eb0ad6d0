//! Write/read round trips through memory and the filesystem

mod common;

use common::*;
use dxfdoc::layouts::EntitySpace;
use dxfdoc::{Document, DocumentOptions, DxfError, DxfVersion};

#[test]
fn test_roundtrip_keeps_handles_records_and_ownership() {
    for version in DxfVersion::CREATABLE {
        let mut doc = sample_drawing(version);
        let loaded = roundtrip(&mut doc);

        assert_eq!(loaded.version(), version);
        let before: Vec<_> = doc.modelspace().handles().to_vec();
        let after: Vec<_> = loaded.modelspace().handles().to_vec();
        assert_eq!(before, after, "{}: model space handles changed", version);
        assert_eq!(block_membership(&doc), block_membership(&loaded), "{}", version);
        assert!(loaded.tables().has_record("LAYER", "Walls"));
        assert!(loaded.blocks().contains("DOOR"));
        assert_eq!(loaded.blocks().get("DOOR").unwrap().len(), 2);
        assert!(handles_are_unique(&loaded));
    }
}

#[test]
fn test_second_roundtrip_is_stable() {
    let mut doc = sample_drawing(DxfVersion::AC1018);
    let mut first = roundtrip(&mut doc);
    let mut once = Vec::new();
    first.write(&mut once).unwrap();
    let mut second = Document::read(once.as_slice()).unwrap();
    let mut twice = Vec::new();
    second.write(&mut twice).unwrap();
    assert_eq!(once.len(), twice.len());
    assert_eq!(first.db().len(), second.db().len());
}

#[test]
fn test_entity_types_survive() {
    let mut doc = sample_drawing(DxfVersion::AC1015);
    let loaded = roundtrip(&mut doc);
    let msp = loaded.modelspace();
    let types: Vec<String> = msp.entities().iter().map(|e| e.dxftype().to_string()).collect();
    assert_eq!(types, vec!["LINE", "CIRCLE", "TEXT", "POLYLINE", "INSERT"]);
    assert_eq!(msp.len(), SAMPLE_MODELSPACE_COUNT);
    // POLYLINE keeps its VERTEX/SEQEND followers
    let polyline = msp.query("POLYLINE")[0].handle();
    assert_eq!(loaded.db().followers(polyline).len(), 4);
}

#[test]
fn test_save_and_readfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.dxf");

    let mut doc = sample_drawing(DxfVersion::AC1024);
    doc.saveas(&path, None).unwrap();
    assert_eq!(doc.filename.as_deref(), Some(path.as_path()));

    let mut loaded = Document::readfile(&path).unwrap();
    assert_eq!(loaded.version(), DxfVersion::AC1024);
    assert_eq!(loaded.modelspace().len(), SAMPLE_MODELSPACE_COUNT);

    loaded.new_layer("Doors").unwrap();
    loaded.save(None).unwrap();
    let reloaded = Document::readfile(&path).unwrap();
    assert!(reloaded.layer("Doors").is_ok());
}

#[test]
fn test_readfile_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Document::readfile(dir.path().join("missing.dxf"));
    assert!(matches!(result, Err(DxfError::Io(_))));
}

#[test]
fn test_legacy_encoding_follows_codepage() {
    let mut doc = Document::new(DxfVersion::AC1009).unwrap();
    doc.new_layer("Straße").unwrap();
    let mut buffer = Vec::new();
    doc.write_with_encoding(&mut buffer, Some(encoding_rs::WINDOWS_1252)).unwrap();
    // one byte per character in cp1252
    assert!(buffer.windows(6).any(|w| w == b"Stra\xDFe"));
    let loaded = Document::read(buffer.as_slice()).unwrap();
    assert!(loaded.layer("Straße").is_ok());
}

#[test]
fn test_options_from_toml() {
    let options = DocumentOptions::from_toml("audit_on_load = true\nstore_comments = false\n").unwrap();
    let mut doc = sample_drawing(DxfVersion::AC1015);
    let mut buffer = Vec::new();
    doc.write(&mut buffer).unwrap();
    let loaded = Document::read_with_options(buffer.as_slice(), options).unwrap();
    assert!(loaded.options().audit_on_load);
    assert!(loaded.audit().is_empty());
    assert!(!loaded.notifications.iter().any(|n| n.message.contains("Undefined")));
}

#[test]
fn test_names_outside_code_page_roundtrip() {
    for version in [DxfVersion::AC1009, DxfVersion::AC1015, DxfVersion::AC1018] {
        let mut doc = Document::new(version).unwrap();
        doc.new_layer("Стены").unwrap();
        let mut buffer = Vec::new();
        doc.write_with_encoding(&mut buffer, Some(encoding_rs::WINDOWS_1252)).unwrap();
        assert!(buffer.windows(7).any(|w| w == b"\\U+0421"), "{}", version);

        let loaded = Document::read(buffer.as_slice()).unwrap();
        assert!(loaded.layer("Стены").is_ok(), "{}", version);
        assert!(loaded.tables().has_record("LAYER", "СТЕНЫ"));
    }
}
