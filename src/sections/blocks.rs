//! BLOCKS section: block definitions and their member entities

use ahash::AHashMap;
use indexmap::IndexMap;

use super::write_entity;
use crate::database::EntityDb;
use crate::error::{DxfError, Result};
use crate::io::dxf::{TagWriter, TagWriterExt};
use crate::types::Handle;

/// Name of the model space block in the extended schema
pub const MODEL_SPACE: &str = "*Model_Space";
/// Name of the active paper space block in the extended schema
pub const PAPER_SPACE: &str = "*Paper_Space";
/// Legacy names of the same blocks
pub const LEGACY_MODEL_SPACE: &str = "$MODEL_SPACE";
pub const LEGACY_PAPER_SPACE: &str = "$PAPER_SPACE";

/// True for the model space block name of either schema.
pub fn is_model_space(name: &str) -> bool {
    name.eq_ignore_ascii_case(MODEL_SPACE) || name.eq_ignore_ascii_case(LEGACY_MODEL_SPACE)
}

/// True for `*Paper_Space`, `*Paper_Space0`, ... and `$PAPER_SPACE`.
pub fn is_paper_space(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper == LEGACY_PAPER_SPACE
        || upper
            .strip_prefix("*PAPER_SPACE")
            .map_or(false, |rest| rest.chars().all(|c| c.is_ascii_digit()))
}

/// True for the active paper space block name of either schema.
pub fn is_active_paper_space(name: &str) -> bool {
    name.eq_ignore_ascii_case(PAPER_SPACE) || name.eq_ignore_ascii_case(LEGACY_PAPER_SPACE)
}

/// One block definition.
///
/// `record` is null in the legacy schema and until management tables
/// are set up.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub name: String,
    pub block: Handle,
    pub endblk: Handle,
    pub record: Handle,
    pub entities: Vec<Handle>,
}

impl BlockLayout {
    pub fn new(name: &str, block: Handle, endblk: Handle, record: Handle) -> Self {
        Self {
            name: name.to_string(),
            block,
            endblk,
            record,
            entities: Vec::new(),
        }
    }

    /// Key of this block: the record handle if set, else the BLOCK handle.
    pub fn key(&self) -> Handle {
        if self.record.is_valid() {
            self.record
        } else {
            self.block
        }
    }

    pub fn is_layout_block(&self) -> bool {
        is_model_space(&self.name) || is_paper_space(&self.name)
    }
}

/// Block definitions keyed by block key, with the owning block of every
/// member entity.
#[derive(Debug, Clone, Default)]
pub struct BlocksSection {
    blocks: IndexMap<Handle, BlockLayout>,
    owners: AHashMap<Handle, Handle>,
}

impl BlocksSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, key: Handle) -> Option<&BlockLayout> {
        self.blocks.get(&key)
    }

    /// Block by name, case-insensitive
    pub fn by_name(&self, name: &str) -> Option<&BlockLayout> {
        self.blocks.values().find(|b| b.name.eq_ignore_ascii_case(name))
    }

    pub fn key_of(&self, name: &str) -> Option<Handle> {
        self.by_name(name).map(BlockLayout::key)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name(name).is_some()
    }

    pub fn contains_key(&self, key: Handle) -> bool {
        self.blocks.contains_key(&key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.values().map(|b| b.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockLayout> {
        self.blocks.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = Handle> + '_ {
        self.blocks.keys().copied()
    }

    /// Add a block definition; its member entities become owned by it.
    pub fn insert(&mut self, block: BlockLayout) -> Result<Handle> {
        if self.contains_name(&block.name) {
            return Err(DxfError::duplicate("block", block.name));
        }
        let key = block.key();
        for handle in &block.entities {
            if let Some(owner) = self.owners.get(handle) {
                return Err(DxfError::Ownership {
                    handle: *handle,
                    owner: *owner,
                });
            }
        }
        for handle in &block.entities {
            self.owners.insert(*handle, key);
        }
        self.blocks.insert(key, block);
        Ok(key)
    }

    /// Remove a block definition and release its members.
    pub fn remove(&mut self, key: Handle) -> Option<BlockLayout> {
        let block = self.blocks.shift_remove(&key)?;
        for handle in &block.entities {
            self.owners.remove(handle);
        }
        Some(block)
    }

    /// Block key owning `entity`
    pub fn owner_of(&self, entity: Handle) -> Option<Handle> {
        self.owners.get(&entity).copied()
    }

    /// Append `entity` to block `key`.
    pub fn link(&mut self, key: Handle, entity: Handle) -> Result<()> {
        if let Some(owner) = self.owners.get(&entity) {
            return Err(DxfError::Ownership {
                handle: entity,
                owner: *owner,
            });
        }
        let block = self
            .blocks
            .get_mut(&key)
            .ok_or(DxfError::HandleNotFound(key))?;
        block.entities.push(entity);
        self.owners.insert(entity, key);
        Ok(())
    }

    /// Detach `entity` from its block; returns the former block key.
    pub fn unlink(&mut self, entity: Handle) -> Option<Handle> {
        let key = self.owners.remove(&entity)?;
        if let Some(block) = self.blocks.get_mut(&key) {
            block.entities.retain(|h| *h != entity);
        }
        Some(key)
    }

    /// Attach a block record; the block is re-keyed by it.
    pub fn set_record(&mut self, key: Handle, record: Handle) -> Result<Handle> {
        let block = self.blocks.get(&key).ok_or(DxfError::HandleNotFound(key))?;
        let mut updated = block.clone();
        updated.record = record;
        let new_key = updated.key();
        if new_key == key {
            if let Some(block) = self.blocks.get_mut(&key) {
                block.record = record;
            }
            return Ok(key);
        }
        if self.blocks.contains_key(&new_key) {
            return Err(DxfError::Structural(format!(
                "block record {:X} already used by another block",
                record
            )));
        }
        self.blocks = self
            .blocks
            .drain(..)
            .map(|(k, b)| if k == key { (new_key, updated.clone()) } else { (k, b) })
            .collect();
        for owner in self.owners.values_mut() {
            if *owner == key {
                *owner = new_key;
            }
        }
        Ok(new_key)
    }

    pub fn rename(&mut self, key: Handle, name: &str) -> Result<()> {
        if self
            .by_name(name)
            .map_or(false, |other| other.key() != key)
        {
            return Err(DxfError::duplicate("block", name));
        }
        let block = self
            .blocks
            .get_mut(&key)
            .ok_or(DxfError::HandleNotFound(key))?;
        block.name = name.to_string();
        Ok(())
    }

    /// Write the section. Entities of `inline` blocks (model space and
    /// the active paper space) are written to ENTITIES instead.
    pub fn write<W: TagWriter + ?Sized>(
        &self,
        db: &EntityDb,
        w: &mut W,
        inline: &[Handle],
    ) -> Result<()> {
        w.write_section_start("BLOCKS")?;
        for (key, block) in &self.blocks {
            w.write_tags(db.get(block.block)?.tags())?;
            if !inline.contains(key) {
                for entity in &block.entities {
                    write_entity(db, *entity, w)?;
                }
            }
            w.write_tags(db.get(block.endblk)?.tags())?;
        }
        w.write_section_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: &str, block: u64) -> BlockLayout {
        BlockLayout::new(name, Handle::new(block), Handle::new(block + 1), Handle::NULL)
    }

    #[test]
    fn test_layout_block_names() {
        assert!(is_model_space("*MODEL_SPACE"));
        assert!(is_model_space("$MODEL_SPACE"));
        assert!(is_paper_space("*Paper_Space"));
        assert!(is_paper_space("*Paper_Space12"));
        assert!(!is_paper_space("*Paper_SpaceX"));
        assert!(is_active_paper_space("$PAPER_SPACE"));
        assert!(!is_active_paper_space("*Paper_Space0"));
    }

    #[test]
    fn test_exclusive_membership() {
        let mut blocks = BlocksSection::new();
        let a = blocks.insert(block("A", 0x10)).unwrap();
        let b = blocks.insert(block("B", 0x20)).unwrap();
        let entity = Handle::new(0x30);
        blocks.link(a, entity).unwrap();
        assert!(matches!(
            blocks.link(b, entity),
            Err(DxfError::Ownership { .. })
        ));
        assert_eq!(blocks.unlink(entity), Some(a));
        blocks.link(b, entity).unwrap();
        assert_eq!(blocks.owner_of(entity), Some(b));
        assert!(blocks.get(a).map_or(false, |blk| blk.entities.is_empty()));
    }

    #[test]
    fn test_duplicate_block_name() {
        let mut blocks = BlocksSection::new();
        blocks.insert(block("Door", 0x10)).unwrap();
        assert!(matches!(
            blocks.insert(block("DOOR", 0x20)),
            Err(DxfError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_set_record_rekeys_members() {
        let mut blocks = BlocksSection::new();
        let first = blocks.insert(block("A", 0x10)).unwrap();
        blocks.insert(block("B", 0x20)).unwrap();
        blocks.link(first, Handle::new(0x40)).unwrap();
        let key = blocks.set_record(first, Handle::new(0x50)).unwrap();
        assert_eq!(key, Handle::new(0x50));
        assert_eq!(blocks.owner_of(Handle::new(0x40)), Some(key));
        assert_eq!(blocks.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(!blocks.contains_key(first));
    }
}
