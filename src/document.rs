//! The document facade: load, create, query and save drawings

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::config::DocumentOptions;
use crate::database::{EntityDb, TagGroup};
use crate::error::{DxfError, Result};
use crate::factory::{
    Dictionary, Entity, EntityFactory, ImageDef, Layer, UnderlayFormat,
};
use crate::io::dxf::{
    code_page_from_encoding, DxfTextReader, DxfTextWriter, Tag, TagWriter, TagWriterExt,
};
use crate::layouts::Layouts;
use crate::notification::{NotificationCollection, NotificationType};
use crate::repair::RepairPipeline;
use crate::sections::{
    self, tables::LEGACY_TABLES, ClassesSection, EntitiesSection, HeaderSection, ObjectsSection,
    RawSection, Table, TablesSection, BlocksSection,
};
use crate::templates;
use crate::types::{julian_date, DxfVersion, Handle, Vector2};

/// Prefix of the provenance comment written on save
const PROVENANCE: &str = "last saved by dxfdoc";

/// A DXF drawing: header, tables, blocks, entities and objects over one
/// handle-keyed database.
///
/// Every document returned by a constructor has been through the repair
/// pipeline, so management tables, layout blocks and handles exist.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) version: DxfVersion,
    pub(crate) encoding: &'static Encoding,
    pub(crate) factory: EntityFactory,
    pub(crate) db: EntityDb,
    pub(crate) header: HeaderSection,
    pub(crate) classes: ClassesSection,
    pub(crate) tables: TablesSection,
    pub(crate) blocks: BlocksSection,
    pub(crate) entities: EntitiesSection,
    pub(crate) objects: ObjectsSection,
    pub(crate) unknown_sections: Vec<RawSection>,
    pub(crate) layouts: Layouts,
    pub(crate) options: DocumentOptions,
    /// Leading `999` comment lines
    pub comments: Vec<String>,
    /// Findings of loading, repair and merging
    pub notifications: NotificationCollection,
    /// File the document was read from or last saved to
    pub filename: Option<PathBuf>,
}

impl Document {
    /// New empty document of a creatable revision.
    pub fn new(version: DxfVersion) -> Result<Self> {
        Self::new_with_options(version, DocumentOptions::default())
    }

    pub fn new_with_options(version: DxfVersion, options: DocumentOptions) -> Result<Self> {
        if !version.is_creatable() {
            return Err(DxfError::revision(
                format!("creating {} documents", version.release()),
                version,
            ));
        }
        let text = templates::template_text(version, options.template_dir.as_deref())?;
        let mut doc = Self::read_with_options(text.as_bytes(), options)?;
        if doc.version != version {
            doc.set_version(version)?;
        }
        let now = julian_date(Local::now().naive_local());
        doc.header.set_float("$TDCREATE", now);
        doc.header.set_float("$TDUPDATE", now);
        doc.notifications.clear();
        info!(version = %version, "new document");
        Ok(doc)
    }

    /// New document from a revision tag (`AC1015`) or release name (`R2000`).
    pub fn new_from_str(version: &str) -> Result<Self> {
        let parsed = DxfVersion::parse(version).ok_or_else(|| DxfError::UnsupportedRevision {
            feature: format!("revision '{}'", version),
            version: DxfVersion::LEGACY,
        })?;
        Self::new(parsed)
    }

    /// Read a document from a DXF text stream.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        Self::read_with_options(reader, DocumentOptions::default())
    }

    pub fn read_with_options<R: BufRead>(reader: R, options: DocumentOptions) -> Result<Self> {
        let mut stream = DxfTextReader::new(reader);
        let loaded = sections::load(&mut stream)?;
        let mut doc = Self {
            version: loaded.version,
            encoding: loaded.encoding,
            factory: EntityFactory::new(loaded.version),
            db: loaded.db,
            header: loaded.header,
            classes: loaded.classes,
            tables: loaded.tables,
            blocks: loaded.blocks,
            entities: loaded.entities,
            objects: loaded.objects,
            unknown_sections: loaded.unknown,
            layouts: Layouts::default(),
            options,
            comments: loaded.comments,
            notifications: loaded.notifications,
            filename: None,
        };

        let changed = RepairPipeline::standard().run(&mut doc)?;
        if !changed.is_empty() {
            debug!(passes = ?changed, "document repaired");
        }
        if doc.options.compress_binary_data {
            doc.db.compress_binary_data()?;
        }
        if doc.options.audit_on_load {
            let report = doc.audit();
            for finding in report.iter() {
                doc.notifications.warn(finding.to_string());
            }
        }
        info!(
            version = %doc.version,
            groups = doc.db.len(),
            layouts = doc.layouts.len(),
            "document loaded"
        );
        Ok(doc)
    }

    /// Read a document from a file.
    pub fn readfile(path: impl AsRef<Path>) -> Result<Self> {
        Self::readfile_with_options(path, DocumentOptions::default())
    }

    pub fn readfile_with_options(path: impl AsRef<Path>, options: DocumentOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut doc = Self::read_with_options(BufReader::new(file), options)?;
        doc.filename = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Revision of the document
    pub fn version(&self) -> DxfVersion {
        self.version
    }

    /// Release name, e.g. `R2000` for AC1015
    pub fn acad_release(&self) -> &'static str {
        self.version.release()
    }

    /// Text encoding used for non-unicode revisions
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn factory(&self) -> &EntityFactory {
        &self.factory
    }

    pub fn is_legacy(&self) -> bool {
        self.factory.is_legacy()
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Raw access to every tag group
    pub fn db(&self) -> &EntityDb {
        &self.db
    }

    pub fn header(&self) -> &HeaderSection {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderSection {
        &mut self.header
    }

    pub fn classes(&self) -> &ClassesSection {
        &self.classes
    }

    pub fn tables(&self) -> &TablesSection {
        &self.tables
    }

    pub fn objects(&self) -> &ObjectsSection {
        &self.objects
    }

    pub fn unknown_sections(&self) -> &[RawSection] {
        &self.unknown_sections
    }

    /// Move to another revision of the same schema.
    pub(crate) fn set_version(&mut self, version: DxfVersion) -> Result<()> {
        self.factory.set_version(version)?;
        self.version = version;
        self.header.set_str("$ACADVER", 1, version.as_str());
        if version.is_unicode() {
            self.encoding = encoding_rs::UTF_8;
        }
        Ok(())
    }

    /// Typed view of any group
    pub fn entity(&self, handle: Handle) -> Result<Entity<&TagGroup>> {
        self.factory.wrap(&self.db, handle)
    }

    pub fn entity_mut(&mut self, handle: Handle) -> Result<Entity<&mut TagGroup>> {
        self.factory.wrap_mut(&mut self.db, handle)
    }

    /// Entities of model space and the active paper space
    pub fn entities(&self) -> Vec<Entity<&TagGroup>> {
        let (model, paper) = self.active_layout_keys();
        [model, paper]
            .iter()
            .filter_map(|key| self.blocks.get(*key))
            .flat_map(|block| block.entities.iter())
            .filter_map(|h| self.entity(*h).ok())
            .collect()
    }

    /// Block keys of model space and the active paper space; null when
    /// missing.
    pub fn active_layout_keys(&self) -> (Handle, Handle) {
        let (model, paper) = crate::layouts::layout_block_names(self.factory.schema());
        (
            self.blocks.key_of(model).unwrap_or(Handle::NULL),
            self.blocks.key_of(paper).unwrap_or(Handle::NULL),
        )
    }

    /// Create the table `name` if it does not exist; returns its head.
    pub(crate) fn ensure_table(&mut self, name: &str) -> Result<Handle> {
        if let Some(table) = self.tables.get(name) {
            return Ok(table.head());
        }
        let head = self.db.add_new(self.factory.new_table_head(&name.to_uppercase()));
        self.tables.insert(Table::new(name, head))?;
        debug!(table = name, "table created");
        Ok(head)
    }

    /// Register a new table record; names are unique per table.
    pub(crate) fn add_table_record(&mut self, table: &str, mut record: TagGroup) -> Result<Handle> {
        let name = record.get_str(2).unwrap_or_default().to_string();
        if self.tables.has_record(table, &name) {
            return Err(DxfError::Duplicate {
                kind: "table record",
                name: format!("{}/{}", table.to_uppercase(), name),
            });
        }
        let head = self.ensure_table(table)?;
        if !self.is_legacy() {
            record.set_owner(head);
        }
        let handle = self.db.add_new(record);
        self.tables.table_mut(table)?.add(&name, handle)?;
        Ok(handle)
    }

    /// Existing record handle, or a new record with default attributes.
    /// The flag is true if the record was created.
    pub(crate) fn ensure_table_record(&mut self, table: &str, name: &str) -> Result<(Handle, bool)> {
        if let Some(handle) = self.tables.record(table, name) {
            return Ok((handle, false));
        }
        let record = self.factory.new_table_record(&table.to_uppercase(), name)?;
        Ok((self.add_table_record(table, record)?, true))
    }

    /// Create a table record of `table` (e.g. `LAYER`, `LTYPE`, `APPID`).
    pub fn new_table_record(&mut self, table: &str, name: &str) -> Result<Handle> {
        let record = self.factory.new_table_record(&table.to_uppercase(), name)?;
        self.add_table_record(table, record)
    }

    /// Create a layer; fails with `Duplicate` if the name is taken.
    pub fn new_layer(&mut self, name: &str) -> Result<Handle> {
        self.new_table_record("LAYER", name)
    }

    pub fn layer(&self, name: &str) -> Result<Layer<&TagGroup>> {
        let handle = self
            .tables
            .record("LAYER", name)
            .ok_or_else(|| DxfError::not_found("layer", name))?;
        Ok(Layer::new(self.db.get(handle)?, self.factory.schema()))
    }

    pub fn layer_mut(&mut self, name: &str) -> Result<Layer<&mut TagGroup>> {
        let handle = self
            .tables
            .record("LAYER", name)
            .ok_or_else(|| DxfError::not_found("layer", name))?;
        let schema = self.factory.schema();
        Ok(Layer::new(self.db.get_mut(handle)?, schema))
    }

    /// Root dictionary entry `name`
    pub(crate) fn rootdict_entry(&self, name: &str) -> Option<Handle> {
        let root = self.objects.rootdict();
        let group = self.db.get(root).ok()?;
        Dictionary::new(group, self.factory.schema()).get(name)
    }

    /// Register a new object owned by `owner`.
    pub(crate) fn add_object(&mut self, mut object: TagGroup, owner: Handle) -> Handle {
        object.set_owner(owner);
        let handle = self.db.add_new(object);
        self.objects.push(handle);
        handle
    }

    /// Set an entry of the dictionary `dict`.
    pub(crate) fn set_dict_entry(&mut self, dict: Handle, name: &str, value: Handle) -> Result<()> {
        let schema = self.factory.schema();
        Dictionary::new(self.db.get_mut(dict)?, schema).set(name, value);
        Ok(())
    }

    /// Root dictionary entry `name`, created as an empty dictionary if
    /// missing. Returns the handle and whether it was created.
    pub(crate) fn ensure_root_dict(&mut self, name: &str) -> Result<(Handle, bool)> {
        if let Some(handle) = self.rootdict_entry(name).filter(|h| self.db.contains(*h)) {
            return Ok((handle, false));
        }
        let root = self.objects.rootdict();
        if root.is_null() {
            return Err(DxfError::Structural("missing root dictionary".to_string()));
        }
        let dict = self.factory.new_dictionary(false)?;
        let handle = self.add_object(dict, root);
        self.set_dict_entry(root, name, handle)?;
        Ok((handle, true))
    }

    /// Add an IMAGEDEF object named `name` for a raster file.
    pub fn add_image_def(&mut self, filename: &str, size_in_pixel: Vector2, name: &str) -> Result<Handle> {
        let def = self.factory.new_image_def(filename, size_in_pixel)?;
        let (dict, _) = self.ensure_root_dict("ACAD_IMAGE_DICT")?;
        let handle = self.add_object(def, dict);
        self.set_dict_entry(dict, name, handle)?;
        Ok(handle)
    }

    /// Add an underlay definition (PDF, DWF or DGN) for `filename`.
    pub fn add_underlay_def(
        &mut self,
        filename: &str,
        format: UnderlayFormat,
        name: &str,
    ) -> Result<Handle> {
        let def = self.factory.new_underlay_def(format, filename, name)?;
        let (dict, _) = self.ensure_root_dict(format.dictionary_name())?;
        let handle = self.add_object(def, dict);
        self.set_dict_entry(dict, name, handle)?;
        Ok(handle)
    }

    /// Size in pixels of an IMAGEDEF object
    pub(crate) fn image_def_size(&self, image_def: Handle) -> Result<Vector2> {
        let group = self.db.get(image_def)?;
        if group.dxftype() != "IMAGEDEF" {
            return Err(DxfError::InvalidOperation(format!(
                "{:X} is a {}, not an IMAGEDEF",
                image_def,
                group.dxftype()
            )));
        }
        Ok(ImageDef::new(group, self.factory.schema()).size_in_pixel())
    }

    /// Audit without changing anything.
    pub fn audit(&self) -> crate::audit::AuditReport {
        crate::audit::audit(self)
    }

    /// Remove stale references; returns the number of removed items.
    ///
    /// With `groups`, members of GROUP objects that no longer exist are
    /// dropped and empty groups deleted.
    pub fn cleanup(&mut self, groups: bool) -> Result<usize> {
        let mut removed = 0;
        if groups {
            removed += crate::groups::cleanup(self)?;
        }
        if removed > 0 {
            info!(removed, "cleanup");
        }
        Ok(removed)
    }

    /// Write the document as DXF text in its default encoding.
    pub fn write<W: Write>(&mut self, writer: W) -> Result<()> {
        self.write_with_encoding(writer, None)
    }

    /// Write the document; `None` picks UTF-8 for AC1021+ and the
    /// document code page otherwise.
    pub fn write_with_encoding<W: Write>(
        &mut self,
        writer: W,
        encoding: Option<&'static Encoding>,
    ) -> Result<()> {
        let encoding = encoding.unwrap_or_else(|| self.output_encoding());
        self.refresh_metadata(encoding)?;
        let mut w = DxfTextWriter::with_encoding(writer, encoding);
        self.write_tags(&mut w)?;
        w.flush()
    }

    /// Save to the file the document was read from or last saved to.
    pub fn save(&mut self, encoding: Option<&'static Encoding>) -> Result<()> {
        let path = self
            .filename
            .clone()
            .ok_or_else(|| DxfError::InvalidOperation("document has no file name".to_string()))?;
        let file = File::create(&path)?;
        self.write_with_encoding(BufWriter::new(file), encoding)?;
        info!(path = %path.display(), version = %self.version, "document saved");
        Ok(())
    }

    pub fn saveas(&mut self, path: impl AsRef<Path>, encoding: Option<&'static Encoding>) -> Result<()> {
        self.filename = Some(path.as_ref().to_path_buf());
        self.save(encoding)
    }

    fn output_encoding(&self) -> &'static Encoding {
        if self.version.is_unicode() {
            encoding_rs::UTF_8
        } else {
            self.encoding
        }
    }

    /// Stamp header variables, provenance comment and required app ids.
    fn refresh_metadata(&mut self, encoding: &'static Encoding) -> Result<()> {
        let now = Local::now();
        self.header.set_str("$ACADVER", 1, self.version.as_str());
        self.header
            .set_float("$TDUPDATE", julian_date(now.naive_local()));
        self.header.set_handle("$HANDSEED", self.db.seed());
        let code_page = if self.version.is_unicode() {
            code_page_from_encoding(self.encoding)
        } else {
            code_page_from_encoding(encoding)
        };
        self.header.set_str("$DWGCODEPAGE", 3, code_page);
        if !self.is_legacy() {
            self.ensure_table_record("APPID", "HATCHBACKGROUNDCOLOR")?;
        }
        self.comments.retain(|c| !c.starts_with(PROVENANCE));
        self.comments.push(format!(
            "{} {} on {}",
            PROVENANCE,
            env!("CARGO_PKG_VERSION"),
            now.format("%Y-%m-%d %H:%M:%S")
        ));
        Ok(())
    }

    /// Emit all sections in their fixed order.
    pub fn write_tags<W: TagWriter + ?Sized>(&self, w: &mut W) -> Result<()> {
        let extended = !self.is_legacy();
        if self.options.store_comments {
            for comment in &self.comments {
                w.write_tag(&Tag::string(999, comment.as_str()))?;
            }
        }
        self.header.write(w)?;
        if extended {
            self.classes.write(w)?;
        }
        self.tables.write(&self.db, w, extended)?;

        let (model, paper) = self.active_layout_keys();
        self.blocks.write(&self.db, w, &[model, paper])?;
        let spaces: Vec<&[Handle]> = [model, paper]
            .iter()
            .filter_map(|key| self.blocks.get(*key))
            .map(|block| block.entities.as_slice())
            .collect();
        EntitiesSection::write(&self.db, w, &spaces)?;
        if extended {
            self.objects.write(&self.db, w)?;
        }
        for section in &self.unknown_sections {
            section.write(w)?;
        }
        w.write_eof()
    }

    /// Tables every document of this schema needs
    pub(crate) fn required_tables(&self) -> Vec<&'static str> {
        let mut tables = LEGACY_TABLES.to_vec();
        if !self.is_legacy() {
            tables.push("BLOCK_RECORD");
        }
        tables
    }

    pub(crate) fn note(&mut self, kind: NotificationType, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "{}", kind);
        self.notifications.notify(kind, message);
    }
}
