//! CLASSES section (extended schema only)

use crate::database::TagGroup;
use crate::error::Result;
use crate::io::dxf::{TagWriter, TagWriterExt};

/// `CLASS` groups, kept as read. Classes carry no handles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassesSection {
    classes: Vec<TagGroup>,
}

impl ClassesSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups(classes: Vec<TagGroup>) -> Self {
        Self { classes }
    }

    /// Class by DXF record name (code 1)
    pub fn get(&self, name: &str) -> Option<&TagGroup> {
        self.classes.iter().find(|c| c.get_str(1) == Some(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a class unless one with the same name exists.
    pub fn add(&mut self, class: TagGroup) {
        let exists = class.get_str(1).map_or(false, |name| self.contains(name));
        if !exists {
            self.classes.push(class);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagGroup> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn write<W: TagWriter + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_section_start("CLASSES")?;
        for class in &self.classes {
            w.write_tags(class.tags())?;
        }
        w.write_section_end()
    }
}
