//! TABLES section: symbol tables mapping record names to handles

use indexmap::IndexMap;

use crate::database::EntityDb;
use crate::error::{DxfError, Result};
use crate::io::dxf::{Tag, TagWriter, TagWriterExt};
use crate::types::Handle;

/// Write order of the standard tables
pub const TABLE_ORDER: [&str; 9] = [
    "VPORT",
    "LTYPE",
    "LAYER",
    "STYLE",
    "VIEW",
    "UCS",
    "APPID",
    "DIMSTYLE",
    "BLOCK_RECORD",
];

/// Tables every legacy document carries
pub const LEGACY_TABLES: [&str; 8] = [
    "VPORT", "LTYPE", "LAYER", "STYLE", "VIEW", "UCS", "APPID", "DIMSTYLE",
];

/// Record name normalization: names compare case-insensitively.
pub fn table_key(name: &str) -> String {
    name.to_uppercase()
}

/// One symbol table: `TABLE` head plus named records.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    head: Handle,
    entries: IndexMap<String, Handle>,
}

impl Table {
    pub fn new(name: &str, head: Handle) -> Self {
        Self {
            name: name.to_uppercase(),
            head,
            entries: IndexMap::new(),
        }
    }

    /// Table name, e.g. `LAYER`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle of the `TABLE` head group
    pub fn head(&self) -> Handle {
        self.head
    }

    pub fn get(&self, name: &str) -> Option<Handle> {
        self.entries.get(&table_key(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&table_key(name))
    }

    /// Register a record; names must be unique.
    pub fn add(&mut self, name: &str, handle: Handle) -> Result<()> {
        let key = table_key(name);
        if self.entries.contains_key(&key) {
            return Err(DxfError::Duplicate {
                kind: "table record",
                name: format!("{}/{}", self.name, name),
            });
        }
        self.entries.insert(key, handle);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Handle> {
        self.entries.shift_remove(&table_key(name))
    }

    /// Move a record to a new name.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let handle = self
            .get(old)
            .ok_or_else(|| DxfError::not_found("table record", old))?;
        self.add(new, handle)?;
        self.entries.shift_remove(&table_key(old));
        Ok(())
    }

    /// Record handles in table order
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.values().copied()
    }

    /// Normalized record names and handles
    pub fn entries(&self) -> impl Iterator<Item = (&str, Handle)> {
        self.entries.iter().map(|(k, h)| (k.as_str(), *h))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write head (with refreshed count), records and `ENDTAB`.
    pub fn write<W: TagWriter + ?Sized>(&self, db: &EntityDb, w: &mut W) -> Result<()> {
        let mut head = db.get(self.head)?.clone();
        head.set_int(70, self.entries.len() as i64);
        w.write_tags(head.tags())?;
        for handle in self.handles() {
            w.write_tags(db.get(handle)?.tags())?;
        }
        w.write_tag(&Tag::structure("ENDTAB"))
    }
}

/// All symbol tables of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablesSection {
    tables: IndexMap<String, Table>,
}

impl TablesSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(&table_key(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&table_key(name))
    }

    /// Table lookup failing with `NotFound`
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.get(name).ok_or_else(|| DxfError::not_found("table", name))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.get_mut(name).ok_or_else(|| DxfError::not_found("table", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&table_key(name))
    }

    pub fn insert(&mut self, table: Table) -> Result<()> {
        if self.contains(table.name()) {
            return Err(DxfError::duplicate("table", table.name()));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Table> {
        self.tables.shift_remove(&table_key(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Record handle of `name` in table `table`
    pub fn record(&self, table: &str, name: &str) -> Option<Handle> {
        self.get(table).and_then(|t| t.get(name))
    }

    pub fn has_record(&self, table: &str, name: &str) -> bool {
        self.record(table, name).is_some()
    }

    /// Tables in write order: the standard ones first, then the rest as read.
    pub fn ordered(&self, include_block_records: bool) -> Vec<&Table> {
        let mut ordered: Vec<&Table> = TABLE_ORDER
            .iter()
            .filter(|name| include_block_records || **name != "BLOCK_RECORD")
            .filter_map(|name| self.tables.get(*name))
            .collect();
        ordered.extend(
            self.tables
                .values()
                .filter(|t| !TABLE_ORDER.contains(&t.name())),
        );
        ordered
    }

    pub fn write<W: TagWriter + ?Sized>(
        &self,
        db: &EntityDb,
        w: &mut W,
        include_block_records: bool,
    ) -> Result<()> {
        w.write_section_start("TABLES")?;
        for table in self.ordered(include_block_records) {
            table.write(db, w)?;
        }
        w.write_section_end()
    }
}
