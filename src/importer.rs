//! Copying entities, blocks and table records between documents

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use tracing::{debug, info};

use crate::database::TagGroup;
use crate::document::Document;
use crate::error::{DxfError, Result};
use crate::factory::{Block, BlockFlags, Dictionary, GraphicAttribs, UnderlayFormat};
use crate::layouts::{EntitySpace, EntitySpaceMut};
use crate::naming::unique_name;
use crate::notification::NotificationType;
use crate::types::{Handle, Vector3};

/// How source model space lands in the target document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeMode {
    /// Copy the entities into target model space as they are
    Flat,
    /// Copy into target model space and move every copy onto one layer
    Layer(String),
    /// Copy into a new block definition and insert it at the origin of
    /// target model space
    Block(String),
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Flat => write!(f, "flat"),
            MergeMode::Layer(name) => write!(f, "layer:{}", name),
            MergeMode::Block(name) => write!(f, "block:{}", name),
        }
    }
}

impl FromStr for MergeMode {
    type Err = DxfError;

    /// `flat`, `layer:NAME` or `block:NAME`
    fn from_str(s: &str) -> Result<Self> {
        let (kind, name) = match s.split_once(':') {
            Some((kind, name)) => (kind, Some(name)),
            None => (s, None),
        };
        match (kind.to_ascii_lowercase().as_str(), name) {
            ("flat", None) => Ok(MergeMode::Flat),
            ("layer", Some(name)) if !name.is_empty() => Ok(MergeMode::Layer(name.to_string())),
            ("block", Some(name)) if !name.is_empty() => Ok(MergeMode::Block(name.to_string())),
            _ => Err(DxfError::InvalidOperation(format!(
                "invalid merge mode '{}', expected flat, layer:NAME or block:NAME",
                s
            ))),
        }
    }
}

/// What a merge copied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Entities placed in the target space
    pub entities: usize,
    pub layers: usize,
    pub linetypes: usize,
    pub text_styles: usize,
    pub blocks: usize,
    /// Image and underlay definitions
    pub definitions: usize,
    /// Images and underlays whose definition is missing in the source
    pub skipped: usize,
    /// Block created by [`MergeMode::Block`]
    pub block_name: Option<String>,
}

/// Copies content of `source` into `target`.
///
/// Handles are never copied: every copy gets a fresh target handle and
/// its pointers are rewritten to the copies of their targets, or dropped.
pub struct Importer<'s, 't> {
    source: &'s Document,
    target: &'t mut Document,
    handles: AHashMap<Handle, Handle>,
    block_names: AHashMap<String, String>,
    summary: MergeSummary,
}

impl<'s, 't> Importer<'s, 't> {
    /// Both documents must share one schema.
    pub fn new(source: &'s Document, target: &'t mut Document) -> Result<Self> {
        if source.factory.schema() != target.factory.schema() {
            return Err(DxfError::revision(
                format!("importing from {}", source.acad_release()),
                target.version(),
            ));
        }
        Ok(Self {
            source,
            target,
            handles: AHashMap::new(),
            block_names: AHashMap::new(),
            summary: MergeSummary::default(),
        })
    }

    /// Copy the table record `name` unless the target has one of that
    /// name; returns the target record.
    pub fn import_table_record(&mut self, table: &str, name: &str) -> Result<Handle> {
        if let Some(existing) = self.target.tables.record(table, name) {
            if let Some(source) = self.source.tables.record(table, name) {
                self.handles.insert(source, existing);
            }
            return Ok(existing);
        }
        let handle = match self.source.tables.record(table, name) {
            Some(source) => {
                let group = self.detach(self.source.db.get(source)?.clone());
                let handle = self.target.add_table_record(table, group)?;
                self.handles.insert(source, handle);
                handle
            }
            None => self.target.ensure_table_record(table, name)?.0,
        };
        match table.to_uppercase().as_str() {
            "LAYER" => self.summary.layers += 1,
            "LTYPE" => self.summary.linetypes += 1,
            "STYLE" => self.summary.text_styles += 1,
            _ => {}
        }
        debug!(table, record = name, "table record imported");
        Ok(handle)
    }

    /// Copy the block definition `name` and the blocks it references.
    /// Returns the name in the target, which gets a suffix on collision.
    pub fn import_block(&mut self, name: &str) -> Result<String> {
        if let Some(imported) = self.block_names.get(&name.to_uppercase()) {
            return Ok(imported.clone());
        }
        let source = self
            .source
            .blocks
            .by_name(name)
            .ok_or_else(|| DxfError::not_found("block", name))?;
        if source.is_layout_block() {
            return Err(DxfError::InvalidOperation(format!(
                "layout block '{}' cannot be imported",
                name
            )));
        }
        let head = Block::new(self.source.db.get(source.block)?, self.source.factory.schema());
        let (base_point, flags) = (head.base_point(), head.flags());
        let members = source.entities.clone();

        let target = &*self.target;
        let target_name = unique_name(name, |candidate| target.blocks.contains_name(candidate))?;
        self.block_names
            .insert(name.to_uppercase(), target_name.clone());
        let key = self.target.create_block(&target_name, base_point, flags, false)?;
        for handle in members {
            self.copy_entity(handle, key, None)?;
        }
        self.summary.blocks += 1;
        debug!(block = name, target = %target_name, "block imported");
        Ok(target_name)
    }

    /// Copy `handles` of the source into the target block `target_key`;
    /// with `layer`, every copy is moved onto that layer.
    pub fn import_entities(&mut self, handles: &[Handle], target_key: Handle, layer: Option<&str>) -> Result<usize> {
        if let Some(layer) = layer {
            self.import_table_record("LAYER", layer)?;
        }
        let mut count = 0;
        for handle in handles {
            if self.copy_entity(*handle, target_key, layer)?.is_some() {
                count += 1;
            }
        }
        self.summary.entities += count;
        Ok(count)
    }

    /// Copy source model space according to `mode`.
    pub fn import_modelspace(&mut self, mode: &MergeMode) -> Result<()> {
        let source_handles = self.source.modelspace().handles().to_vec();
        let model = self.target.active_layout_keys().0;
        match mode {
            MergeMode::Flat => {
                self.import_entities(&source_handles, model, None)?;
            }
            MergeMode::Layer(layer) => {
                self.import_entities(&source_handles, model, Some(layer))?;
            }
            MergeMode::Block(name) => {
                let target = &*self.target;
                let block_name = unique_name(name, |candidate| target.blocks.contains_name(candidate))?;
                let key = self
                    .target
                    .create_block(&block_name, Vector3::ZERO, BlockFlags::empty(), false)?;
                self.import_entities(&source_handles, key, None)?;
                self.target
                    .modelspace_mut()
                    .add_blockref(&block_name, Vector3::ZERO, &GraphicAttribs::default())?;
                self.summary.blocks += 1;
                self.summary.block_name = Some(block_name);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> MergeSummary {
        self.summary
    }

    /// Copy the image or underlay definition `handle` into the matching
    /// root dictionary of the target, under a unique entry name.
    pub fn import_definition(&mut self, handle: Handle) -> Result<Handle> {
        if let Some(copied) = self.handles.get(&handle) {
            return Ok(*copied);
        }
        let source = self.source;
        let group = source.db.get(handle)?;
        let dict_name = match group.dxftype() {
            "IMAGEDEF" => "ACAD_IMAGE_DICT",
            other => UnderlayFormat::from_definition_type(other)
                .map(|format| format.dictionary_name())
                .ok_or_else(|| {
                    DxfError::InvalidOperation(format!("#{:X} is not an image or underlay definition", handle))
                })?,
        };
        let schema = source.factory.schema();
        let entry = source
            .rootdict_entry(dict_name)
            .and_then(|dict| source.db.get(dict).ok())
            .and_then(|dict| {
                Dictionary::new(dict, schema)
                    .entries()
                    .into_iter()
                    .find(|(_, value)| *value == handle)
                    .map(|(name, _)| name)
            })
            .unwrap_or_else(|| group.dxftype().to_string());

        let (dict, _) = self.target.ensure_root_dict(dict_name)?;
        let target = &*self.target;
        let entries = Dictionary::new(target.db.get(dict)?, schema);
        let name = unique_name(&entry, |candidate| entries.get(candidate).is_some())?;

        let copy = self.detach(group.clone());
        let new = self.target.add_object(copy, dict);
        self.target.set_dict_entry(dict, &name, new)?;
        self.handles.insert(handle, new);
        self.summary.definitions += 1;
        debug!(dictionary = dict_name, entry = %name, "definition imported");
        Ok(new)
    }

    /// Strip identity: handle, owner, application data, extension
    /// dictionary and pointers to anything not yet copied.
    fn detach(&self, mut group: TagGroup) -> TagGroup {
        group.strip_app_data();
        group.remove(group.handle_code());
        group.remap_pointers(|h| self.handles.get(&h).copied());
        group
    }

    fn copy_entity(&mut self, handle: Handle, target_key: Handle, layer: Option<&str>) -> Result<Option<Handle>> {
        let source = self.source;
        let group = source.db.get(handle)?;
        let dxftype = group.dxftype().to_string();
        if matches!(
            dxftype.as_str(),
            "IMAGE" | "PDFUNDERLAY" | "DWFUNDERLAY" | "DGNUNDERLAY"
        ) {
            let definition = group.get_handle(340).filter(|h| source.db.contains(*h));
            match definition {
                Some(definition) => {
                    self.import_definition(definition)?;
                }
                None => {
                    self.summary.skipped += 1;
                    self.target.note(
                        NotificationType::NotSupported,
                        format!("{} #{:X} not imported: definition missing", dxftype, handle),
                    );
                    return Ok(None);
                }
            }
        }

        if layer.is_none() {
            if let Some(name) = group.get_str(8) {
                self.import_table_record("LAYER", name)?;
            }
        }
        if let Some(linetype) = group.get_str(6) {
            if !linetype.eq_ignore_ascii_case("BYLAYER") && !linetype.eq_ignore_ascii_case("BYBLOCK") {
                self.import_table_record("LTYPE", linetype)?;
            }
        }
        let mut block_name = None;
        match dxftype.as_str() {
            "TEXT" | "MTEXT" | "ATTDEF" => {
                if let Some(style) = group.get_str(7) {
                    self.import_table_record("STYLE", style)?;
                }
            }
            "INSERT" | "DIMENSION" => {
                if let Some(name) = group.get_str(2).filter(|n| !n.is_empty()) {
                    block_name = Some(self.import_block(name)?);
                }
            }
            _ => {}
        }

        let mut copy = self.detach(group.clone());
        if let Some(layer) = layer {
            copy.set_str(8, layer);
        }
        if let Some(name) = &block_name {
            copy.set_str(2, name);
        }
        let followers = source
            .db
            .followers(handle)
            .iter()
            .map(|h| source.db.get(*h).map(|g| self.detach(g.clone())))
            .collect::<Result<Vec<_>>>()?;
        let followers = match layer {
            Some(layer) => followers
                .into_iter()
                .map(|mut f| {
                    f.set_str(8, layer);
                    f
                })
                .collect(),
            None => followers,
        };
        let new = self.target.add_entity_group(target_key, copy, followers)?;
        self.handles.insert(handle, new);
        Ok(Some(new))
    }
}

/// Copy model space of `source` into `target`.
///
/// The copy is staged on a clone of `target`, which is left untouched
/// when the merge fails.
pub fn merge(source: &Document, target: &mut Document, mode: &MergeMode) -> Result<MergeSummary> {
    let mut staged = target.clone();
    let mut importer = Importer::new(source, &mut staged)?;
    importer.import_modelspace(mode)?;
    let summary = importer.finish();
    *target = staged;
    info!(
        mode = %mode,
        entities = summary.entities,
        blocks = summary.blocks,
        definitions = summary.definitions,
        skipped = summary.skipped,
        "merged"
    );
    Ok(summary)
}

impl Document {
    /// Copy the model space of `source` into this document.
    pub fn merge(&mut self, source: &Document, mode: &MergeMode) -> Result<MergeSummary> {
        merge(source, self, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DxfVersion, Vector2};

    fn source() -> Document {
        let mut doc = Document::new(DxfVersion::AC1015).unwrap();
        doc.new_layer("WALLS").unwrap();
        doc.new_table_record("LTYPE", "DASHED").unwrap();
        {
            let mut door = doc.blocks_mut().new("DOOR", Vector3::ZERO).unwrap();
            door.add_arc(Vector3::ZERO, 1.0, 0.0, 90.0, &GraphicAttribs::on_layer("WALLS"))
                .unwrap();
        }
        let mut msp = doc.modelspace_mut();
        let walls = GraphicAttribs::on_layer("WALLS").with_linetype("DASHED");
        msp.add_line(Vector3::ZERO, Vector3::new(5.0, 0.0, 0.0), &walls).unwrap();
        msp.add_polyline2d(
            &[Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)],
            false,
            &GraphicAttribs::default(),
        )
        .unwrap();
        msp.add_blockref("DOOR", Vector3::new(2.0, 0.0, 0.0), &GraphicAttribs::default())
            .unwrap();
        doc
    }

    #[test]
    fn test_merge_modes_from_str() {
        assert_eq!("flat".parse::<MergeMode>().unwrap(), MergeMode::Flat);
        assert_eq!(
            "layer:IMPORT".parse::<MergeMode>().unwrap(),
            MergeMode::Layer("IMPORT".to_string())
        );
        assert!("layer:".parse::<MergeMode>().is_err());
        assert!("stack".parse::<MergeMode>().is_err());
    }

    #[test]
    fn test_flat_merge() {
        let source = source();
        let mut target = Document::new(DxfVersion::AC1015).unwrap();
        let summary = target.merge(&source, &MergeMode::Flat).unwrap();
        assert_eq!(summary.entities, 3);
        assert_eq!(summary.blocks, 1);
        assert_eq!(target.entities().len(), source.modelspace().len());
        assert!(target.tables().has_record("LAYER", "WALLS"));
        assert!(target.tables().has_record("LTYPE", "DASHED"));
        assert_eq!(target.blocks().get("DOOR").unwrap().len(), 1);
        assert!(target.audit().is_empty(), "{:?}", target.audit());
    }

    #[test]
    fn test_block_name_collision() {
        let source = source();
        let mut target = Document::new(DxfVersion::AC1015).unwrap();
        target.blocks_mut().new("DOOR", Vector3::ZERO).unwrap();
        target.merge(&source, &MergeMode::Flat).unwrap();
        assert!(target.blocks().contains("DOOR_1"));
        let msp = target.modelspace();
        let insert = msp.query("INSERT");
        assert_eq!(insert[0].group().get_str(2), Some("DOOR_1"));
    }

    #[test]
    fn test_layer_and_block_modes() {
        let source = source();
        let mut target = Document::new(DxfVersion::AC1015).unwrap();
        target.merge(&source, &MergeMode::Layer("IMPORT".to_string())).unwrap();
        assert!(target
            .modelspace()
            .entities()
            .iter()
            .all(|e| e.group().get_str(8) == Some("IMPORT")));

        let mut target = Document::new(DxfVersion::AC1015).unwrap();
        let summary = target.merge(&source, &MergeMode::Block("PART".to_string())).unwrap();
        assert_eq!(summary.block_name.as_deref(), Some("PART"));
        assert_eq!(target.modelspace().len(), 1);
        assert_eq!(target.blocks().get("PART").unwrap().len(), 3);
    }

    #[test]
    fn test_cross_schema_merge_refused() {
        let source = Document::new(DxfVersion::AC1009).unwrap();
        let mut target = Document::new(DxfVersion::AC1015).unwrap();
        assert!(matches!(
            target.merge(&source, &MergeMode::Flat),
            Err(DxfError::UnsupportedRevision { .. })
        ));
    }

    #[test]
    fn test_shared_definition_copied_once() {
        let mut source = Document::new(DxfVersion::AC1015).unwrap();
        let def = source
            .add_image_def("logo.png", Vector2::new(64.0, 64.0), "logo")
            .unwrap();
        {
            let mut msp = source.modelspace_mut();
            for x in [0.0, 10.0] {
                msp.add_image(def, Vector3::new(x, 0.0, 0.0), Vector2::new(1.0, 1.0), &GraphicAttribs::default())
                    .unwrap();
            }
        }
        let mut target = Document::new(DxfVersion::AC1015).unwrap();
        target.add_image_def("other.png", Vector2::new(8.0, 8.0), "logo").unwrap();

        let summary = target.merge(&source, &MergeMode::Flat).unwrap();
        assert_eq!(summary.entities, 2);
        assert_eq!(summary.definitions, 1);
        let dict = target.rootdict_entry("ACAD_IMAGE_DICT").unwrap();
        let dict = Dictionary::new(target.db.get(dict).unwrap(), target.factory.schema());
        let copied = dict.get("logo_1").unwrap();
        let msp = target.modelspace();
        assert!(msp
            .query("IMAGE")
            .iter()
            .all(|e| e.group().get_handle(340) == Some(copied)));
    }
}
