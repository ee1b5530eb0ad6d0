use tracing::debug;

use super::RepairPass;
use crate::document::Document;
use crate::error::{DxfError, Result};
use crate::factory::BlockFlags;
use crate::layouts::{layout_block_names, Layouts, MODEL_LAYOUT};
use crate::naming::MAX_SUFFIX;
use crate::sections::blocks::{is_active_paper_space, is_paper_space};
use crate::types::{Handle, Vector3};

/// Puts every entity into a layout block.
///
/// Creates missing model and paper space blocks, moves the entities of
/// the ENTITIES section into model space or the active paper space (by
/// owner tag, else by the `67` paper space flag) and rewrites stale
/// owner tags of block members. Extended documents also get a LAYOUT
/// object for every layout block.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkLayouts;

impl RepairPass for LinkLayouts {
    fn name(&self) -> &str {
        "LinkLayouts"
    }

    fn apply(&self, doc: &mut Document) -> Result<bool> {
        let mut changed = ensure_layout_blocks(doc)?;
        changed |= link_pending(doc)?;
        if !doc.is_legacy() {
            changed |= fix_owners(doc)?;
            changed |= ensure_layout_objects(doc)?;
        }
        doc.rebuild_layouts();
        Ok(changed)
    }
}

fn ensure_layout_blocks(doc: &mut Document) -> Result<bool> {
    let (model, paper) = layout_block_names(doc.factory.schema());
    let mut changed = false;
    if !doc.blocks.contains_name(model) {
        doc.create_block(model, Vector3::ZERO, BlockFlags::empty(), false)?;
        changed = true;
    }
    if !doc.blocks.contains_name(paper) {
        doc.create_block(paper, Vector3::ZERO, BlockFlags::empty(), true)?;
        changed = true;
    }
    Ok(changed)
}

fn link_pending(doc: &mut Document) -> Result<bool> {
    let pending = doc.entities.take_pending();
    if pending.is_empty() {
        return Ok(false);
    }
    let (model, paper) = doc.active_layout_keys();
    let extended = !doc.is_legacy();
    for handle in &pending {
        let group = doc.db.get(*handle)?;
        let owner = if extended { group.owner() } else { None };
        let target = match owner {
            Some(owner) if doc.blocks.contains_key(owner) => owner,
            _ if group.get_int(67) == Some(1) => paper,
            _ => model,
        };
        doc.link_entity(target, *handle)?;
    }
    debug!(count = pending.len(), "entities linked into layouts");
    Ok(true)
}

/// Owner tags of members must name their block, followers their main entity.
fn fix_owners(doc: &mut Document) -> Result<bool> {
    let mut fixes: Vec<(Handle, Handle)> = Vec::new();
    for block in doc.blocks.iter() {
        let key = block.key();
        for handle in &block.entities {
            if doc.db.get(*handle)?.owner() != Some(key) {
                fixes.push((*handle, key));
            }
            for follower in doc.db.followers(*handle) {
                if doc.db.get(*follower)?.owner() != Some(*handle) {
                    fixes.push((*follower, *handle));
                }
            }
        }
    }
    for (handle, owner) in &fixes {
        doc.db.get_mut(*handle)?.set_owner(*owner);
    }
    if !fixes.is_empty() {
        debug!(count = fixes.len(), "owner tags fixed");
    }
    Ok(!fixes.is_empty())
}

fn ensure_layout_objects(doc: &mut Document) -> Result<bool> {
    let mut layouts = Layouts::collect(doc);
    let has_object = |layouts: &Layouts, key: Handle| {
        layouts
            .by_block(key)
            .map_or(false, |l| l.layout_object.is_valid())
    };
    let mut changed = false;

    let (model, _) = doc.active_layout_keys();
    if !has_object(&layouts, model) {
        doc.add_layout_object(MODEL_LAYOUT, 0, model)?;
        layouts = Layouts::collect(doc);
        changed = true;
    }

    // Active paper space first, so it gets the first free tab
    let mut paper_blocks: Vec<(Handle, bool)> = doc
        .blocks
        .iter()
        .filter(|b| is_paper_space(&b.name))
        .map(|b| (b.key(), is_active_paper_space(&b.name)))
        .collect();
    paper_blocks.sort_by_key(|(_, active)| !*active);

    for (key, _) in paper_blocks {
        if has_object(&layouts, key) {
            continue;
        }
        let name = (1..MAX_SUFFIX)
            .map(|n| format!("Layout{}", n))
            .find(|candidate| !layouts.contains(candidate))
            .ok_or_else(|| DxfError::InvalidOperation("no free layout name".to_string()))?;
        let tab_order = layouts.iter().map(|l| l.tab_order).max().unwrap_or(0) + 1;
        doc.add_layout_object(&name, tab_order, key)?;
        debug!(layout = %name, block = %key, "layout object created");
        layouts = Layouts::collect(doc);
        changed = true;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts::EntitySpace;
    use crate::types::DxfVersion;

    const LEGACY_PAPER: &str = "  0\nSECTION\n  2\nENTITIES\n  0\nPOINT\n  8\n0\n 10\n0.0\n 20\n0.0\n  0\nPOINT\n 67\n1\n  8\n0\n 10\n5.0\n 20\n5.0\n  0\nENDSEC\n  0\nEOF\n";

    #[test]
    fn test_pending_entities_split_by_space_flag() {
        let doc = Document::read(LEGACY_PAPER.as_bytes()).unwrap();
        assert_eq!(doc.version(), DxfVersion::AC1009);
        assert_eq!(doc.modelspace().len(), 1);
        assert_eq!(doc.layout("Layout1").unwrap().len(), 1);
        assert_eq!(doc.entities().len(), 2);
    }

    #[test]
    fn test_layout_objects_for_every_paper_block() {
        let mut doc = Document::new(DxfVersion::AC1015).unwrap();
        doc.create_block("*Paper_Space3", Vector3::ZERO, BlockFlags::empty(), true)
            .unwrap();
        assert!(LinkLayouts.apply(&mut doc).unwrap());
        assert_eq!(doc.layout_names(), vec!["Model", "Layout1", "Layout2"]);
        assert!(!LinkLayouts.apply(&mut doc).unwrap());
    }
}
