//! Shared helpers for the dxfdoc integration tests.
//!
//! Each test crate pulls these in with `mod common;`.

#![allow(dead_code)]

use std::collections::HashMap;

use dxfdoc::factory::GraphicAttribs;
use dxfdoc::layouts::{EntitySpace, EntitySpaceMut};
use dxfdoc::{Document, DxfVersion, Handle, Vector2, Vector3};

// ===========================================================================
// Sample streams
// ===========================================================================

/// R12 stream without any handles: a HEADER lacking `$HANDSEED`, a LAYER
/// table, a block definition and five entities, one of them in paper space.
pub const LEGACY_WITHOUT_HANDLES: &str = "  0
SECTION
  2
HEADER
  9
$ACADVER
  1
AC1009
  9
$DWGCODEPAGE
  3
ANSI_1252
  0
ENDSEC
  0
SECTION
  2
TABLES
  0
TABLE
  2
LAYER
 70
1
  0
LAYER
  2
0
 70
0
 62
7
  6
CONTINUOUS
  0
ENDTAB
  0
ENDSEC
  0
SECTION
  2
BLOCKS
  0
BLOCK
  8
0
  2
MARK
 70
0
 10
0.0
 20
0.0
 30
0.0
  3
MARK
  0
CIRCLE
  8
0
 10
0.0
 20
0.0
 30
0.0
 40
1.0
  0
ENDBLK
  8
0
  0
ENDSEC
  0
SECTION
  2
ENTITIES
  0
LINE
  8
0
 10
0.0
 20
0.0
 30
0.0
 11
10.0
 21
0.0
 31
0.0
  0
POINT
  8
0
 10
5.0
 20
5.0
 30
0.0
  0
INSERT
  8
0
  2
MARK
 10
2.0
 20
2.0
 30
0.0
  0
CIRCLE
  8
0
 10
3.0
 20
3.0
 30
0.0
 40
0.5
  0
POINT
 67
1
  8
0
 10
1.0
 20
1.0
 30
0.0
  0
ENDSEC
  0
EOF
";

/// Number of model space entities in [`LEGACY_WITHOUT_HANDLES`].
pub const LEGACY_MODELSPACE_COUNT: usize = 4;

// ===========================================================================
// Builders
// ===========================================================================

/// A small drawing: layer `Walls`, a block `DOOR` with two lines, and a
/// line, circle, text, polyline and INSERT of `DOOR` in model space.
pub fn sample_drawing(version: DxfVersion) -> Document {
    let mut doc = Document::new(version).expect("creatable version");
    doc.new_layer("Walls").expect("new layer");
    {
        let mut door = doc.blocks_mut().new("DOOR", Vector3::ZERO).expect("new block");
        let attribs = GraphicAttribs::on_layer("Walls");
        door.add_line(Vector3::ZERO, Vector3::new(0.0, 2.0, 0.0), &attribs).unwrap();
        door.add_line(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), &attribs).unwrap();
    }
    let walls = GraphicAttribs::on_layer("Walls");
    let mut msp = doc.modelspace_mut();
    msp.add_line(Vector3::ZERO, Vector3::new(10.0, 0.0, 0.0), &walls).unwrap();
    msp.add_circle(Vector3::new(5.0, 5.0, 0.0), 2.5, &GraphicAttribs::default())
        .unwrap();
    msp.add_text("plan", Vector3::new(1.0, 8.0, 0.0), 0.5, &GraphicAttribs::default())
        .unwrap();
    msp.add_polyline2d(
        &[Vector2::new(0.0, 0.0), Vector2::new(4.0, 0.0), Vector2::new(4.0, 3.0)],
        true,
        &walls,
    )
    .unwrap();
    msp.add_blockref("DOOR", Vector3::new(3.0, 0.0, 0.0), &GraphicAttribs::default())
        .unwrap();
    doc
}

/// Model space entities created by [`sample_drawing`].
pub const SAMPLE_MODELSPACE_COUNT: usize = 5;

// ===========================================================================
// Round trips
// ===========================================================================

/// Serialize `doc` to memory and parse it back.
pub fn roundtrip(doc: &mut Document) -> Document {
    let mut buffer = Vec::new();
    doc.write(&mut buffer).expect("write to memory");
    Document::read(buffer.as_slice()).expect("read back")
}

/// Block name to entity handles, for every block of `doc`.
pub fn block_membership(doc: &Document) -> HashMap<String, Vec<Handle>> {
    doc.blocks()
        .iter()
        .map(|block| (block.name().to_uppercase(), block.handles().to_vec()))
        .collect()
}

/// True if no entity handle appears in more than one block.
pub fn ownership_is_exclusive(doc: &Document) -> bool {
    let mut seen = std::collections::HashSet::new();
    doc.blocks()
        .iter()
        .flat_map(|block| block.handles().to_vec())
        .all(|handle| seen.insert(handle))
}

/// True if every group of the database has a distinct, valid handle tag.
pub fn handles_are_unique(doc: &Document) -> bool {
    let mut seen = std::collections::HashSet::new();
    doc.db()
        .iter()
        .all(|(key, group)| group.handle() == Some(key) && key.is_valid() && seen.insert(key))
}
