//! Layouts, blocks and moving entities between them

mod common;

use common::*;
use dxfdoc::factory::GraphicAttribs;
use dxfdoc::layouts::{EntitySpace, EntitySpaceMut};
use dxfdoc::{Document, DxfError, DxfVersion, Vector3};

#[test]
fn test_new_layout_needs_extended_schema() {
    let mut legacy = Document::new(DxfVersion::AC1009).unwrap();
    assert!(matches!(
        legacy.new_layout("Sheet"),
        Err(DxfError::UnsupportedRevision { .. })
    ));

    let mut doc = Document::new(DxfVersion::AC1015).unwrap();
    {
        let mut sheet = doc.new_layout("Sheet").unwrap();
        assert_eq!(sheet.name(), "Sheet");
        sheet
            .add_circle(Vector3::new(1.0, 1.0, 0.0), 0.5, &GraphicAttribs::default())
            .unwrap();
    }
    assert_eq!(doc.layout_names(), vec!["Model", "Layout1", "Sheet"]);
    assert!(matches!(doc.new_layout("sheet"), Err(DxfError::Duplicate { .. })));

    let loaded = roundtrip(&mut doc);
    assert_eq!(loaded.layout_names(), vec!["Model", "Layout1", "Sheet"]);
    assert_eq!(loaded.layout("Sheet").unwrap().len(), 1);
}

#[test]
fn test_delete_layouts() {
    let mut doc = Document::new(DxfVersion::AC1018).unwrap();
    assert!(matches!(doc.delete_layout("Model"), Err(DxfError::InvalidOperation(_))));
    assert!(matches!(doc.delete_layout("Layout1"), Err(DxfError::InvalidOperation(_))));

    doc.new_layout("Sheet").unwrap();
    doc.delete_layout("Layout1").unwrap();
    assert_eq!(doc.layout_names(), vec!["Model", "Sheet"]);
    // the remaining layout took over the active paper space block
    assert!(doc.layout("Sheet").unwrap().is_active());
    assert!(doc.audit().is_empty(), "{:?}", doc.audit());
}

#[test]
fn test_paper_space_entities_carry_flag() {
    let mut doc = Document::new(DxfVersion::AC1009).unwrap();
    let handle = doc
        .layout_mut("Layout1")
        .unwrap()
        .add_point(Vector3::new(2.0, 2.0, 0.0), &GraphicAttribs::default())
        .unwrap();
    assert_eq!(doc.db().get(handle).unwrap().get_int(67), Some(1));
    let loaded = roundtrip(&mut doc);
    assert!(loaded.layout("Layout1").unwrap().contains(handle));
    assert!(!loaded.modelspace().contains(handle));
}

#[test]
fn test_move_entity_between_spaces() {
    let mut doc = Document::new(DxfVersion::AC1015).unwrap();
    let paper_key = doc.layout("Layout1").unwrap().block_key();
    let line = doc
        .modelspace_mut()
        .add_line(Vector3::ZERO, Vector3::new(1.0, 1.0, 0.0), &GraphicAttribs::default())
        .unwrap();
    doc.modelspace_mut().move_entity_to(line, paper_key).unwrap();

    assert!(doc.modelspace().is_empty());
    assert!(doc.layout("Layout1").unwrap().contains(line));
    let group = doc.db().get(line).unwrap();
    assert_eq!(group.owner(), Some(paper_key));
    assert_eq!(group.get_int(67), Some(1));
    assert!(ownership_is_exclusive(&doc));
}

#[test]
fn test_entity_cannot_join_two_blocks() {
    let mut doc = sample_drawing(DxfVersion::AC1015);
    let line = doc.modelspace().handles()[0];
    let mut door = doc.blocks_mut().get("DOOR").unwrap();
    assert!(matches!(door.link_entity(line), Err(DxfError::Ownership { .. })));
}

#[test]
fn test_block_delete_rules() {
    let mut doc = sample_drawing(DxfVersion::AC1015);
    // referenced by the INSERT in model space
    assert!(doc.blocks_mut().delete("DOOR").is_err());
    assert!(doc.blocks_mut().delete("*Model_Space").is_err());

    let insert = doc.modelspace().query("INSERT")[0].handle();
    doc.modelspace_mut().delete_entity(insert).unwrap();
    doc.blocks_mut().delete("DOOR").unwrap();
    assert!(!doc.blocks().contains("DOOR"));
    assert!(doc.audit().is_empty(), "{:?}", doc.audit());
}

#[test]
fn test_xref_definition() {
    let mut doc = Document::new(DxfVersion::AC1015).unwrap();
    doc.add_xref_def("site/plan.dxf", "SITE").unwrap();
    let loaded = roundtrip(&mut doc);
    let site = loaded.blocks().get("SITE").unwrap();
    assert!(site.is_xref());
    assert_eq!(site.xref_path().as_deref(), Some("site/plan.dxf"));
}

#[test]
fn test_images_need_r2000() {
    let mut doc = Document::new(DxfVersion::AC1015).unwrap();
    let def = doc
        .add_image_def("photo.png", dxfdoc::Vector2::new(640.0, 480.0), "photo")
        .unwrap();
    let image = doc
        .modelspace_mut()
        .add_image(def, Vector3::ZERO, dxfdoc::Vector2::new(6.4, 4.8), &GraphicAttribs::default())
        .unwrap();
    assert_eq!(doc.entity(image).unwrap().dxftype(), "IMAGE");

    let mut legacy = Document::new(DxfVersion::AC1009).unwrap();
    assert!(legacy
        .add_image_def("photo.png", dxfdoc::Vector2::new(1.0, 1.0), "photo")
        .is_err());
}
