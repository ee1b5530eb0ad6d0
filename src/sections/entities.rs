//! ENTITIES section: graphics of model space and the active paper space

use super::write_entity;
use crate::database::EntityDb;
use crate::error::Result;
use crate::io::dxf::{TagWriter, TagWriterExt};
use crate::types::Handle;

/// Entities read from the ENTITIES section that are not yet linked to a
/// layout block. Empty once the document is repaired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitiesSection {
    pending: Vec<Handle>,
}

impl EntitiesSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: Handle) {
        self.pending.push(handle);
    }

    pub fn pending(&self) -> &[Handle] {
        &self.pending
    }

    /// Hand over all pending entities.
    pub fn take_pending(&mut self) -> Vec<Handle> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Write the section from the entity lists of the given blocks.
    pub fn write<W: TagWriter + ?Sized>(
        db: &EntityDb,
        w: &mut W,
        spaces: &[&[Handle]],
    ) -> Result<()> {
        w.write_section_start("ENTITIES")?;
        for space in spaces {
            for handle in space.iter() {
                write_entity(db, *handle, w)?;
            }
        }
        w.write_section_end()
    }
}
