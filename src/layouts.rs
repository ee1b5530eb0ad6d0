//! Layouts, block definitions and the entity spaces behind them
//!
//! Every layout (model space or a paper space tab) is backed by a block
//! definition. Entity spaces are thin views over a [`Document`] and a
//! block key; all mutation goes through the document so the ownership
//! graph in [`BlocksSection`](crate::sections::BlocksSection) and the
//! owner tags of the groups stay in step.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::database::TagGroup;
use crate::document::Document;
use crate::error::{DxfError, Result};
use crate::factory::{
    Block, BlockFlags, BlockRecord, Dictionary, Entity, GraphicAttribs, LayoutObject, Schema,
    UnderlayFormat,
};
use crate::io::dxf::Tag;
use crate::naming::MAX_SUFFIX;
use crate::sections::blocks::{
    is_active_paper_space, is_model_space, is_paper_space, BlockLayout, LEGACY_MODEL_SPACE,
    LEGACY_PAPER_SPACE, MODEL_SPACE, PAPER_SPACE,
};
use crate::types::{Handle, Vector2, Vector3};

/// Name of the model space layout
pub const MODEL_LAYOUT: &str = "Model";

/// Model space and active paper space block names of a schema
pub(crate) fn layout_block_names(schema: Schema) -> (&'static str, &'static str) {
    match schema {
        Schema::Legacy => (LEGACY_MODEL_SPACE, LEGACY_PAPER_SPACE),
        Schema::Extended => (MODEL_SPACE, PAPER_SPACE),
    }
}

/// One layout tab.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInfo {
    pub name: String,
    /// Key of the backing block
    pub block_key: Handle,
    /// LAYOUT object; null in the legacy schema
    pub layout_object: Handle,
    pub tab_order: i64,
}

/// Layout tabs by name, in tab order.
#[derive(Debug, Clone, Default)]
pub struct Layouts {
    entries: IndexMap<String, LayoutInfo>,
}

impl Layouts {
    /// Collect the layouts of a document.
    ///
    /// Extended documents list the LAYOUT objects of the `ACAD_LAYOUT`
    /// dictionary; legacy documents have `Model` and at most one paper
    /// space layout.
    pub(crate) fn collect(doc: &Document) -> Self {
        let mut infos = Vec::new();
        if let Some(dict) = doc.rootdict_entry("ACAD_LAYOUT") {
            let schema = doc.factory.schema();
            let entries = doc
                .db
                .get(dict)
                .map(|group| Dictionary::new(group, schema).entries())
                .unwrap_or_default();
            for (_, handle) in entries {
                let Ok(group) = doc.db.get(handle) else { continue };
                if group.dxftype() != "LAYOUT" {
                    continue;
                }
                let layout = LayoutObject::new(group, schema);
                if doc.blocks.contains_key(layout.block_record()) {
                    infos.push(LayoutInfo {
                        name: layout.name().to_string(),
                        block_key: layout.block_record(),
                        layout_object: handle,
                        tab_order: layout.tab_order(),
                    });
                }
            }
            infos.sort_by_key(|info| info.tab_order);
        }
        if infos.is_empty() {
            let (model, paper) = doc.active_layout_keys();
            if model.is_valid() {
                infos.push(LayoutInfo {
                    name: MODEL_LAYOUT.to_string(),
                    block_key: model,
                    layout_object: Handle::NULL,
                    tab_order: 0,
                });
            }
            if paper.is_valid() {
                infos.push(LayoutInfo {
                    name: "Layout1".to_string(),
                    block_key: paper,
                    layout_object: Handle::NULL,
                    tab_order: 1,
                });
            }
        }
        let mut layouts = Self::default();
        for info in infos {
            layouts.entries.entry(info.name.to_uppercase()).or_insert(info);
        }
        layouts
    }

    pub fn get(&self, name: &str) -> Option<&LayoutInfo> {
        self.entries.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn by_block(&self, key: Handle) -> Option<&LayoutInfo> {
        self.entries.values().find(|info| info.block_key == key)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.values().map(|info| info.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutInfo> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read access to the entities of one block.
pub trait EntitySpace {
    fn document(&self) -> &Document;

    fn block_key(&self) -> Handle;

    /// Name of the backing block
    fn block_name(&self) -> &str {
        self.document()
            .blocks
            .get(self.block_key())
            .map_or("", |block| block.name.as_str())
    }

    /// Member handles in drawing order
    fn handles(&self) -> &[Handle] {
        self.document()
            .blocks
            .get(self.block_key())
            .map_or(&[][..], |block| block.entities.as_slice())
    }

    fn len(&self) -> usize {
        self.handles().len()
    }

    fn is_empty(&self) -> bool {
        self.handles().is_empty()
    }

    fn contains(&self, handle: Handle) -> bool {
        self.document().blocks.owner_of(handle) == Some(self.block_key())
    }

    fn entities(&self) -> Vec<Entity<&TagGroup>> {
        let doc = self.document();
        self.handles()
            .iter()
            .filter_map(|h| doc.entity(*h).ok())
            .collect()
    }

    /// Members of type `dxftype` (case-insensitive)
    fn query(&self, dxftype: &str) -> Vec<Entity<&TagGroup>> {
        self.entities()
            .into_iter()
            .filter(|e| e.dxftype().eq_ignore_ascii_case(dxftype))
            .collect()
    }
}

/// Adding, moving and deleting the entities of one block.
pub trait EntitySpaceMut: EntitySpace {
    fn document_mut(&mut self) -> &mut Document;

    /// Add a prepared group as new member; its handle and owner are set here.
    fn add_group(&mut self, group: TagGroup) -> Result<Handle> {
        let key = self.block_key();
        self.document_mut().add_entity_group(key, group, Vec::new())
    }

    fn add_line(&mut self, start: Vector3, end: Vector3, attribs: &GraphicAttribs) -> Result<Handle> {
        let group = self.document().factory.new_line(start, end, attribs);
        self.add_group(group)
    }

    fn add_point(&mut self, location: Vector3, attribs: &GraphicAttribs) -> Result<Handle> {
        let group = self.document().factory.new_point(location, attribs);
        self.add_group(group)
    }

    fn add_circle(&mut self, center: Vector3, radius: f64, attribs: &GraphicAttribs) -> Result<Handle> {
        let group = self.document().factory.new_circle(center, radius, attribs);
        self.add_group(group)
    }

    /// Arc from `start` to `end` degrees, counter-clockwise.
    fn add_arc(
        &mut self,
        center: Vector3,
        radius: f64,
        start: f64,
        end: f64,
        attribs: &GraphicAttribs,
    ) -> Result<Handle> {
        let group = self
            .document()
            .factory
            .new_arc(center, radius, start, end, attribs);
        self.add_group(group)
    }

    fn add_text(
        &mut self,
        text: &str,
        insert: Vector3,
        height: f64,
        attribs: &GraphicAttribs,
    ) -> Result<Handle> {
        let group = self.document().factory.new_text(text, insert, height, attribs);
        self.add_group(group)
    }

    /// Reference to the block definition `name`, which must exist.
    fn add_blockref(&mut self, name: &str, insert: Vector3, attribs: &GraphicAttribs) -> Result<Handle> {
        if !self.document().blocks.contains_name(name) {
            return Err(DxfError::not_found("block", name));
        }
        let group = self.document().factory.new_insert(name, insert, attribs);
        self.add_group(group)
    }

    /// POLYLINE with its VERTEX and SEQEND followers
    fn add_polyline2d(&mut self, points: &[Vector2], closed: bool, attribs: &GraphicAttribs) -> Result<Handle> {
        let (polyline, followers) = self
            .document()
            .factory
            .new_polyline2d(points, closed, attribs);
        let key = self.block_key();
        self.document_mut().add_entity_group(key, polyline, followers)
    }

    fn add_lwpolyline(&mut self, points: &[Vector2], closed: bool, attribs: &GraphicAttribs) -> Result<Handle> {
        let group = self
            .document()
            .factory
            .new_lwpolyline(points, closed, attribs)?;
        self.add_group(group)
    }

    /// Raster image of `size` drawing units showing the IMAGEDEF `image_def`.
    fn add_image(
        &mut self,
        image_def: Handle,
        insert: Vector3,
        size: Vector2,
        attribs: &GraphicAttribs,
    ) -> Result<Handle> {
        let doc = self.document();
        doc.factory.require("IMAGE", crate::types::DxfVersion::AC1015)?;
        let size_in_pixel = doc.image_def_size(image_def)?;
        let group = doc
            .factory
            .new_image(image_def, insert, size, size_in_pixel, attribs)?;
        self.add_group(group)
    }

    /// Underlay of the definition `underlay_def`; the entity type follows
    /// the definition's format.
    fn add_underlay(
        &mut self,
        underlay_def: Handle,
        insert: Vector3,
        scale: f64,
        attribs: &GraphicAttribs,
    ) -> Result<Handle> {
        let doc = self.document();
        let def_type = doc.db.get(underlay_def)?.dxftype();
        let format = UnderlayFormat::from_definition_type(def_type).ok_or_else(|| {
            DxfError::InvalidOperation(format!(
                "{:X} is a {}, not an underlay definition",
                underlay_def, def_type
            ))
        })?;
        let group = doc
            .factory
            .new_underlay(format, underlay_def, insert, scale, attribs)?;
        self.add_group(group)
    }

    /// Make an unowned entity a member of this space.
    fn link_entity(&mut self, handle: Handle) -> Result<()> {
        let key = self.block_key();
        self.document_mut().link_entity(key, handle)
    }

    /// Release a member without deleting it.
    fn unlink_entity(&mut self, handle: Handle) -> Result<()> {
        let key = self.block_key();
        self.document_mut().unlink_entity(key, handle)
    }

    fn delete_entity(&mut self, handle: Handle) -> Result<()> {
        let key = self.block_key();
        self.document_mut().delete_entity(key, handle)
    }

    /// Move a member to the block `target`.
    fn move_entity_to(&mut self, handle: Handle, target: Handle) -> Result<()> {
        let key = self.block_key();
        self.document_mut().move_entity(key, handle, target)
    }

    /// Delete every member.
    fn delete_all_entities(&mut self) -> Result<usize> {
        let handles = self.handles().to_vec();
        for handle in &handles {
            self.delete_entity(*handle)?;
        }
        Ok(handles.len())
    }
}

/// A layout tab, read only
#[derive(Debug)]
pub struct Layout<'a> {
    doc: &'a Document,
    name: String,
    key: Handle,
}

impl Layout<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_modelspace(&self) -> bool {
        is_model_space(self.block_name())
    }

    /// True for model space and the active paper space
    pub fn is_active(&self) -> bool {
        let name = self.block_name();
        is_model_space(name) || is_active_paper_space(name)
    }
}

impl EntitySpace for Layout<'_> {
    fn document(&self) -> &Document {
        self.doc
    }

    fn block_key(&self) -> Handle {
        self.key
    }
}

#[derive(Debug)]
pub struct LayoutMut<'a> {
    doc: &'a mut Document,
    name: String,
    key: Handle,
}

impl LayoutMut<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EntitySpace for LayoutMut<'_> {
    fn document(&self) -> &Document {
        self.doc
    }

    fn block_key(&self) -> Handle {
        self.key
    }
}

impl EntitySpaceMut for LayoutMut<'_> {
    fn document_mut(&mut self) -> &mut Document {
        self.doc
    }
}

/// A block definition, read only
#[derive(Debug)]
pub struct BlockRef<'a> {
    doc: &'a Document,
    key: Handle,
}

impl BlockRef<'_> {
    pub fn name(&self) -> &str {
        self.block_name()
    }

    fn head(&self) -> Option<Block<&TagGroup>> {
        let block = self.doc.blocks.get(self.key)?;
        let group = self.doc.db.get(block.block).ok()?;
        Some(Block::new(group, self.doc.factory.schema()))
    }

    pub fn base_point(&self) -> Vector3 {
        self.head().map_or(Vector3::ZERO, |b| b.base_point())
    }

    pub fn flags(&self) -> BlockFlags {
        self.head().map_or(BlockFlags::empty(), |b| b.flags())
    }

    pub fn is_layout_block(&self) -> bool {
        self.doc
            .blocks
            .get(self.key)
            .map_or(false, BlockLayout::is_layout_block)
    }

    pub fn is_xref(&self) -> bool {
        self.head().map_or(false, |b| b.is_xref())
    }

    /// Path of the referenced drawing for xref blocks
    pub fn xref_path(&self) -> Option<String> {
        self.head().and_then(|b| b.xref_path().map(str::to_string))
    }
}

impl EntitySpace for BlockRef<'_> {
    fn document(&self) -> &Document {
        self.doc
    }

    fn block_key(&self) -> Handle {
        self.key
    }
}

#[derive(Debug)]
pub struct BlockMut<'a> {
    doc: &'a mut Document,
    key: Handle,
}

impl BlockMut<'_> {
    pub fn name(&self) -> &str {
        self.block_name()
    }

    pub fn set_base_point(&mut self, p: Vector3) -> Result<()> {
        let head = self
            .doc
            .blocks
            .get(self.key)
            .ok_or(DxfError::HandleNotFound(self.key))?
            .block;
        let schema = self.doc.factory.schema();
        Block::new(self.doc.db.get_mut(head)?, schema).set_base_point(p);
        Ok(())
    }
}

impl EntitySpace for BlockMut<'_> {
    fn document(&self) -> &Document {
        self.doc
    }

    fn block_key(&self) -> Handle {
        self.key
    }
}

impl EntitySpaceMut for BlockMut<'_> {
    fn document_mut(&mut self) -> &mut Document {
        self.doc
    }
}

/// Block definitions of a document
#[derive(Debug)]
pub struct Blocks<'a> {
    doc: &'a Document,
}

impl<'a> Blocks<'a> {
    pub fn get(&self, name: &str) -> Result<BlockRef<'a>> {
        let key = self
            .doc
            .blocks
            .key_of(name)
            .ok_or_else(|| DxfError::not_found("block", name))?;
        Ok(BlockRef { doc: self.doc, key })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.doc.blocks.contains_name(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.doc.blocks.names().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.doc.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BlockRef<'a>> + 'a {
        let doc = self.doc;
        doc.blocks.keys().map(move |key| BlockRef { doc, key })
    }
}

#[derive(Debug)]
pub struct BlocksMut<'a> {
    doc: &'a mut Document,
}

impl<'a> BlocksMut<'a> {
    /// Define a new empty block.
    pub fn new(self, name: &str, base_point: Vector3) -> Result<BlockMut<'a>> {
        let key = self.doc.create_block(name, base_point, BlockFlags::empty(), false)?;
        Ok(BlockMut { doc: self.doc, key })
    }

    pub fn get(self, name: &str) -> Result<BlockMut<'a>> {
        let key = self
            .doc
            .blocks
            .key_of(name)
            .ok_or_else(|| DxfError::not_found("block", name))?;
        Ok(BlockMut { doc: self.doc, key })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.doc.blocks.contains_name(name)
    }

    /// Delete a block definition and its members.
    ///
    /// Layout blocks and blocks referenced by an INSERT or DIMENSION are
    /// refused.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let block = self
            .doc
            .blocks
            .by_name(name)
            .ok_or_else(|| DxfError::not_found("block", name))?;
        if block.is_layout_block() {
            return Err(DxfError::InvalidOperation(format!(
                "block '{}' backs a layout",
                name
            )));
        }
        let key = block.key();
        if self.doc.is_block_referenced(name) {
            return Err(DxfError::InvalidOperation(format!(
                "block '{}' is still referenced",
                name
            )));
        }
        self.doc.remove_block(key)
    }
}

impl Document {
    /// Model space layout.
    pub fn modelspace(&self) -> Layout<'_> {
        let key = self.active_layout_keys().0;
        Layout {
            doc: self,
            name: MODEL_LAYOUT.to_string(),
            key,
        }
    }

    pub fn modelspace_mut(&mut self) -> LayoutMut<'_> {
        let key = self.active_layout_keys().0;
        LayoutMut {
            doc: self,
            name: MODEL_LAYOUT.to_string(),
            key,
        }
    }

    /// Layout by tab name, case-insensitive.
    pub fn layout(&self, name: &str) -> Result<Layout<'_>> {
        let info = self
            .layouts
            .get(name)
            .ok_or_else(|| DxfError::not_found("layout", name))?;
        Ok(Layout {
            doc: self,
            name: info.name.clone(),
            key: info.block_key,
        })
    }

    pub fn layout_mut(&mut self, name: &str) -> Result<LayoutMut<'_>> {
        let info = self
            .layouts
            .get(name)
            .ok_or_else(|| DxfError::not_found("layout", name))?;
        let (name, key) = (info.name.clone(), info.block_key);
        Ok(LayoutMut { doc: self, name, key })
    }

    /// Layout names in tab order, `Model` first
    pub fn layout_names(&self) -> Vec<String> {
        self.layouts.names()
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    pub fn blocks(&self) -> Blocks<'_> {
        Blocks { doc: self }
    }

    pub fn blocks_mut(&mut self) -> BlocksMut<'_> {
        BlocksMut { doc: self }
    }

    /// Create a paper space layout backed by a new `*Paper_SpaceN` block.
    pub fn new_layout(&mut self, name: &str) -> Result<LayoutMut<'_>> {
        self.factory.require_extended("new_layout")?;
        if self.layouts.contains(name) {
            return Err(DxfError::duplicate("layout", name));
        }
        let block_name = (0..MAX_SUFFIX)
            .map(|n| format!("{}{}", PAPER_SPACE, n))
            .find(|candidate| !self.blocks.contains_name(candidate))
            .ok_or_else(|| DxfError::InvalidOperation("no free paper space block name".to_string()))?;
        let key = self.create_block(&block_name, Vector3::ZERO, BlockFlags::empty(), true)?;
        let tab_order = self.layouts.iter().map(|l| l.tab_order).max().unwrap_or(0) + 1;
        self.add_layout_object(name, tab_order, key)?;
        self.rebuild_layouts();
        info!(layout = name, block = %block_name, "layout created");
        Ok(LayoutMut {
            doc: self,
            name: name.to_string(),
            key,
        })
    }

    /// Delete a paper space layout with its block and entities.
    ///
    /// Deleting the active layout promotes the next paper space layout.
    pub fn delete_layout(&mut self, name: &str) -> Result<()> {
        self.factory.require_extended("delete_layout")?;
        let info = self
            .layouts
            .get(name)
            .cloned()
            .ok_or_else(|| DxfError::not_found("layout", name))?;
        let block_name = self
            .blocks
            .get(info.block_key)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        if is_model_space(&block_name) {
            return Err(DxfError::InvalidOperation("model space cannot be deleted".to_string()));
        }
        let paper_layouts = self
            .layouts
            .iter()
            .filter(|l| l.block_key != self.active_layout_keys().0)
            .count();
        if paper_layouts <= 1 {
            return Err(DxfError::InvalidOperation(
                "the last paper space layout cannot be deleted".to_string(),
            ));
        }

        if info.layout_object.is_valid() {
            if let Some(dict) = self.rootdict_entry("ACAD_LAYOUT") {
                let schema = self.factory.schema();
                Dictionary::new(self.db.get_mut(dict)?, schema).remove(&info.name);
            }
            self.objects.remove(info.layout_object);
            self.db.remove(info.layout_object)?;
        }
        self.remove_block(info.block_key)?;

        if is_active_paper_space(&block_name) {
            let successor = self
                .layouts
                .iter()
                .filter(|l| l.block_key != info.block_key)
                .filter_map(|l| self.blocks.get(l.block_key))
                .find(|b| is_paper_space(&b.name))
                .map(BlockLayout::key);
            if let Some(key) = successor {
                self.rename_block(key, PAPER_SPACE)?;
            }
        }
        self.rebuild_layouts();
        info!(layout = name, "layout deleted");
        Ok(())
    }

    pub(crate) fn rebuild_layouts(&mut self) {
        self.layouts = Layouts::collect(self);
    }

    /// LAYOUT object for the block `key`, registered in `ACAD_LAYOUT`.
    pub(crate) fn add_layout_object(&mut self, name: &str, tab_order: i64, key: Handle) -> Result<Handle> {
        let (dict, _) = self.ensure_root_dict("ACAD_LAYOUT")?;
        let object = self.factory.new_layout_object(name, tab_order, key)?;
        let handle = self.add_object(object, dict);
        self.set_dict_entry(dict, name, handle)?;
        let schema = self.factory.schema();
        BlockRecord::new(self.db.get_mut(key)?, schema).set_layout(handle);
        Ok(handle)
    }

    /// Add a block definition; extended documents get its BLOCK_RECORD.
    pub(crate) fn create_block(
        &mut self,
        name: &str,
        base_point: Vector3,
        flags: BlockFlags,
        paperspace: bool,
    ) -> Result<Handle> {
        if self.blocks.contains_name(name) {
            return Err(DxfError::duplicate("block", name));
        }
        let record = if self.is_legacy() {
            Handle::NULL
        } else {
            self.ensure_table_record("BLOCK_RECORD", name)?.0
        };
        let mut block = self.factory.new_block(name, base_point, flags.bits(), paperspace);
        let mut endblk = self.factory.new_endblk(paperspace);
        if record.is_valid() {
            block.set_owner(record);
            endblk.set_owner(record);
        }
        let block = self.db.add_new(block);
        let endblk = self.db.add_new(endblk);
        let key = self.blocks.insert(BlockLayout::new(name, block, endblk, record))?;
        debug!(block = name, key = %key, "block created");
        Ok(key)
    }

    /// Add a block referencing the external drawing `filename`.
    pub fn add_xref_def(&mut self, filename: &str, name: &str) -> Result<Handle> {
        let key = self.create_block(
            name,
            Vector3::ZERO,
            BlockFlags::XREF | BlockFlags::EXTERNAL,
            false,
        )?;
        let head = self
            .blocks
            .get(key)
            .ok_or(DxfError::HandleNotFound(key))?
            .block;
        self.db.get_mut(head)?.set_str(Block::<&TagGroup>::XREF_PATH, filename);
        Ok(key)
    }

    /// Remove a block, its members, its record and its head/tail groups.
    pub(crate) fn remove_block(&mut self, key: Handle) -> Result<()> {
        let block = self
            .blocks
            .remove(key)
            .ok_or(DxfError::HandleNotFound(key))?;
        for handle in &block.entities {
            self.db.remove(*handle)?;
        }
        self.db.remove(block.block)?;
        self.db.remove(block.endblk)?;
        if block.record.is_valid() {
            if let Some(table) = self.tables.get_mut("BLOCK_RECORD") {
                table.remove(&block.name);
            }
            self.db.remove(block.record)?;
        }
        debug!(block = %block.name, entities = block.entities.len(), "block removed");
        Ok(())
    }

    /// Rename a block everywhere its name is stored.
    pub(crate) fn rename_block(&mut self, key: Handle, name: &str) -> Result<()> {
        let block = self
            .blocks
            .get(key)
            .cloned()
            .ok_or(DxfError::HandleNotFound(key))?;
        self.blocks.rename(key, name)?;
        let schema = self.factory.schema();
        Block::new(self.db.get_mut(block.block)?, schema).set_name(name);
        if block.record.is_valid() {
            BlockRecord::new(self.db.get_mut(block.record)?, schema).set_name(name);
            self.tables.table_mut("BLOCK_RECORD")?.rename(&block.name, name)?;
        }
        Ok(())
    }

    /// True if an INSERT or DIMENSION inside any block references the
    /// block `name`.
    pub(crate) fn is_block_referenced(&self, name: &str) -> bool {
        self.db.iter().any(|(handle, group)| {
            matches!(group.dxftype(), "INSERT" | "DIMENSION")
                && group
                    .get_str(2)
                    .map_or(false, |n| n.eq_ignore_ascii_case(name))
                && self.blocks.owner_of(handle).is_some()
        })
    }

    /// Register a new entity (and followers) as member of block `key`.
    pub(crate) fn add_entity_group(
        &mut self,
        key: Handle,
        mut group: TagGroup,
        followers: Vec<TagGroup>,
    ) -> Result<Handle> {
        let block = self.blocks.get(key).ok_or(DxfError::HandleNotFound(key))?;
        let paperspace = is_paper_space(&block.name);
        let extended = !self.is_legacy();
        set_space_flag(&mut group, paperspace);
        if extended {
            group.set_owner(key);
        }
        let handle = self.db.add_new(group);
        let mut linked = Vec::with_capacity(followers.len());
        for mut follower in followers {
            set_space_flag(&mut follower, paperspace);
            if extended {
                follower.set_owner(handle);
            }
            linked.push(self.db.add_new(follower));
        }
        self.db.set_followers(handle, linked);
        self.blocks.link(key, handle)?;
        Ok(handle)
    }

    pub(crate) fn link_entity(&mut self, key: Handle, handle: Handle) -> Result<()> {
        if !self.db.contains(handle) {
            return Err(DxfError::HandleNotFound(handle));
        }
        let paperspace = self
            .blocks
            .get(key)
            .map(|b| is_paper_space(&b.name))
            .ok_or(DxfError::HandleNotFound(key))?;
        self.blocks.link(key, handle)?;
        let extended = !self.is_legacy();
        let group = self.db.get_mut(handle)?;
        set_space_flag(group, paperspace);
        if extended {
            group.set_owner(key);
        }
        for follower in self.db.followers(handle).to_vec() {
            set_space_flag(self.db.get_mut(follower)?, paperspace);
        }
        Ok(())
    }

    pub(crate) fn unlink_entity(&mut self, key: Handle, handle: Handle) -> Result<()> {
        if self.blocks.owner_of(handle) != Some(key) {
            return Err(DxfError::InvalidOperation(format!(
                "entity {:X} is not a member of block {:X}",
                handle, key
            )));
        }
        self.blocks.unlink(handle);
        if !self.is_legacy() {
            self.db.get_mut(handle)?.set_owner(Handle::NULL);
        }
        Ok(())
    }

    pub(crate) fn delete_entity(&mut self, key: Handle, handle: Handle) -> Result<()> {
        self.unlink_entity(key, handle)?;
        self.db.remove(handle)?;
        Ok(())
    }

    pub(crate) fn move_entity(&mut self, key: Handle, handle: Handle, target: Handle) -> Result<()> {
        if !self.blocks.contains_key(target) {
            return Err(DxfError::HandleNotFound(target));
        }
        self.unlink_entity(key, handle)?;
        if let Err(err) = self.link_entity(target, handle) {
            self.link_entity(key, handle)?;
            return Err(err);
        }
        Ok(())
    }
}

/// Paper space members carry `67 = 1` right before the layer tag.
fn set_space_flag(group: &mut TagGroup, paperspace: bool) {
    if paperspace {
        if group.contains(67) {
            group.set_int(67, 1);
        } else {
            group.insert_before(8, Tag::int(67, 1));
        }
    } else {
        group.remove(67);
    }
}
