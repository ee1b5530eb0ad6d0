//! Property tests: handle uniqueness and exclusive block ownership hold
//! under arbitrary edit sequences and survive a round trip.

mod common;

use common::*;
use dxfdoc::factory::GraphicAttribs;
use dxfdoc::layouts::{EntitySpace, EntitySpaceMut};
use dxfdoc::{Document, DxfVersion, Vector3};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    AddLine(f64),
    AddPoint(f64),
    AddToBlock(f64),
    /// Delete the n-th model space entity, modulo its length
    Delete(usize),
    /// Move the n-th model space entity to paper space
    MoveToPaper(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (-100.0..100.0f64).prop_map(Edit::AddLine),
        (-100.0..100.0f64).prop_map(Edit::AddPoint),
        (-100.0..100.0f64).prop_map(Edit::AddToBlock),
        any::<usize>().prop_map(Edit::Delete),
        any::<usize>().prop_map(Edit::MoveToPaper),
    ]
}

fn version() -> impl Strategy<Value = DxfVersion> {
    prop::sample::select(DxfVersion::CREATABLE.to_vec())
}

fn nth_modelspace(doc: &Document, n: usize) -> Option<dxfdoc::Handle> {
    let msp = doc.modelspace();
    let handles = msp.handles();
    if handles.is_empty() {
        None
    } else {
        Some(handles[n % handles.len()])
    }
}

fn apply(doc: &mut Document, edit: &Edit) {
    let attribs = GraphicAttribs::default();
    match edit {
        Edit::AddLine(x) => {
            doc.modelspace_mut()
                .add_line(Vector3::new(*x, 0.0, 0.0), Vector3::new(*x, 1.0, 0.0), &attribs)
                .unwrap();
        }
        Edit::AddPoint(x) => {
            doc.modelspace_mut()
                .add_point(Vector3::new(*x, *x, 0.0), &attribs)
                .unwrap();
        }
        Edit::AddToBlock(x) => {
            let exists = doc.blocks().contains("PART");
            let mut block = if exists {
                doc.blocks_mut().get("PART").unwrap()
            } else {
                doc.blocks_mut().new("PART", Vector3::ZERO).unwrap()
            };
            block.add_circle(Vector3::new(*x, 0.0, 0.0), 1.0, &attribs).unwrap();
        }
        Edit::Delete(n) => {
            if let Some(handle) = nth_modelspace(doc, *n) {
                doc.modelspace_mut().delete_entity(handle).unwrap();
            }
        }
        Edit::MoveToPaper(n) => {
            if let Some(handle) = nth_modelspace(doc, *n) {
                let paper = doc.active_layout_keys().1;
                doc.modelspace_mut().move_entity_to(handle, paper).unwrap();
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_invariants_hold_after_edits(version in version(), edits in prop::collection::vec(edit(), 0..40)) {
        let mut doc = Document::new(version).unwrap();
        for edit in &edits {
            apply(&mut doc, edit);
        }
        prop_assert!(handles_are_unique(&doc));
        prop_assert!(ownership_is_exclusive(&doc));

        let loaded = roundtrip(&mut doc);
        prop_assert!(handles_are_unique(&loaded));
        prop_assert!(ownership_is_exclusive(&loaded));
        prop_assert_eq!(block_membership(&doc), block_membership(&loaded));
    }

    #[test]
    fn prop_layer_names_are_case_insensitive(name in "[A-Za-z][A-Za-z0-9_]{0,12}") {
        let mut doc = Document::new(DxfVersion::AC1015).unwrap();
        doc.new_layer(&name).unwrap();
        prop_assert!(doc.new_layer(&name.to_lowercase()).is_err());
        prop_assert!(doc.layer(&name.to_uppercase()).is_ok());
    }
}
