//! Typed views of non-graphical objects (extended schema only)

use std::ops::{Deref, DerefMut};
use std::path::Path;

use super::define_view;
use crate::database::TagGroup;
use crate::error::{DxfError, Result};
use crate::io::dxf::Tag;
use crate::types::{Handle, Vector2};

define_view!(
    /// DICTIONARY: named handle map
    Dictionary
);
define_view!(
    /// GROUP: named selection of entities
    Group
);
define_view!(
    /// LAYOUT: plot settings and the block record of a layout
    LayoutObject
);
define_view!(
    /// IMAGEDEF: raster image file definition
    ImageDef
);
define_view!(
    /// PDFDEFINITION / DWFDEFINITION / DGNDEFINITION
    UnderlayDef
);

/// Dictionary entries are `3 <name>` followed by `350`/`360 <handle>`.
const ENTRY_NAME: i32 = 3;
const SOFT_OWNER: i32 = 350;
const HARD_OWNER: i32 = 360;

impl<T: Deref<Target = TagGroup>> Dictionary<T> {
    /// Entries in stored order
    pub fn entries(&self) -> Vec<(String, Handle)> {
        let tags = self.group.tags();
        let mut entries = Vec::new();
        for (index, tag) in tags.iter().enumerate() {
            if tag.code != ENTRY_NAME {
                continue;
            }
            let name = tag.as_str().unwrap_or_default().to_string();
            if let Some(handle) = tags
                .get(index + 1)
                .filter(|t| t.code == SOFT_OWNER || t.code == HARD_OWNER)
                .and_then(Tag::as_handle)
            {
                entries.push((name, handle));
            }
        }
        entries
    }

    /// Entry lookup; names are case-insensitive
    pub fn get(&self, name: &str) -> Option<Handle> {
        self.entries()
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, handle)| handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_index(&self, name: &str) -> Option<usize> {
        self.group
            .tags()
            .iter()
            .position(|t| t.code == ENTRY_NAME && t.as_str().map_or(false, |s| s.eq_ignore_ascii_case(name)))
    }
}

impl<T: DerefMut<Target = TagGroup>> Dictionary<T> {
    /// Add or replace an entry.
    pub fn set(&mut self, name: &str, handle: Handle) {
        match self.entry_index(name) {
            Some(index) => {
                let code = self.group.tags()[index + 1].code;
                self.group.tags_mut()[index + 1] = Tag::handle(code, handle);
            }
            None => {
                self.group.push(Tag::string(ENTRY_NAME, name));
                self.group.push(Tag::handle(SOFT_OWNER, handle));
            }
        }
    }

    /// Remove an entry; returns its handle.
    pub fn remove(&mut self, name: &str) -> Option<Handle> {
        let index = self.entry_index(name)?;
        let tags = self.group.tags_mut();
        let handle = tags.get(index + 1).and_then(Tag::as_handle);
        let end = if handle.is_some() { index + 2 } else { index + 1 };
        tags.drain(index..end);
        handle
    }

    /// Remove every entry whose handle fails `keep`; returns removed names.
    pub fn retain<F: FnMut(Handle) -> bool>(&mut self, mut keep: F) -> Vec<String> {
        let doomed: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|(_, handle)| !keep(*handle))
            .map(|(name, _)| name)
            .collect();
        for name in &doomed {
            self.remove(name);
        }
        doomed
    }
}

impl<T: Deref<Target = TagGroup>> Group<T> {
    pub const DESCRIPTION: i32 = 300;
    pub const UNNAMED: i32 = 70;
    pub const SELECTABLE: i32 = 71;
    pub const MEMBER: i32 = 340;

    pub fn description(&self) -> &str {
        self.group.get_str(Self::DESCRIPTION).unwrap_or("")
    }

    pub fn is_unnamed(&self) -> bool {
        self.group.get_int(Self::UNNAMED) == Some(1)
    }

    pub fn is_selectable(&self) -> bool {
        self.group.get_int(Self::SELECTABLE).map_or(true, |v| v != 0)
    }

    /// Member entity handles in group order
    pub fn handles(&self) -> Vec<Handle> {
        self.group
            .get_all(Self::MEMBER)
            .filter_map(Tag::as_handle)
            .collect()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.handles().contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: DerefMut<Target = TagGroup>> Group<T> {
    /// Replace the member list.
    pub fn set_handles(&mut self, handles: &[Handle]) {
        self.group.remove(Self::MEMBER);
        self.group
            .extend(handles.iter().map(|h| Tag::handle(Self::MEMBER, *h)));
    }

    pub fn set_description(&mut self, description: &str) {
        self.group.set_str(Self::DESCRIPTION, description);
    }

    /// Keep only members accepted by `keep`; returns the number removed.
    pub fn retain<F: FnMut(Handle) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.handles();
        let after: Vec<Handle> = before.iter().copied().filter(|h| keep(*h)).collect();
        let removed = before.len() - after.len();
        if removed > 0 {
            self.set_handles(&after);
        }
        removed
    }
}

impl<T: Deref<Target = TagGroup>> LayoutObject<T> {
    pub const NAME: i32 = 1;
    pub const TAB_ORDER: i32 = 71;

    /// Layout name, from the AcDbLayout subclass
    pub fn name(&self) -> &str {
        self.layout_tag(Self::NAME)
            .and_then(Tag::as_str)
            .unwrap_or("")
    }

    pub fn tab_order(&self) -> i64 {
        self.layout_tag(Self::TAB_ORDER)
            .and_then(Tag::as_int)
            .unwrap_or(0)
    }

    /// Block record of the layout's entity space
    pub fn block_record(&self) -> Handle {
        self.layout_tag(330)
            .and_then(Tag::as_handle)
            .unwrap_or(Handle::NULL)
    }

    fn layout_tag(&self, code: i32) -> Option<&Tag> {
        self.group
            .subclass("AcDbLayout")
            .and_then(|tags| tags.iter().find(|t| t.code == code))
    }
}

impl<T: DerefMut<Target = TagGroup>> LayoutObject<T> {
    pub fn set_name(&mut self, name: &str) {
        self.set_layout_tag(Tag::string(Self::NAME, name));
    }

    pub fn set_tab_order(&mut self, order: i64) {
        self.set_layout_tag(Tag::int(Self::TAB_ORDER, order));
    }

    pub fn set_block_record(&mut self, record: Handle) {
        self.set_layout_tag(Tag::handle(330, record));
    }

    fn set_layout_tag(&mut self, tag: Tag) {
        let tags = self.group.tags_mut();
        let Some(start) = tags
            .iter()
            .position(|t| t.code == 100 && t.as_str() == Some("AcDbLayout"))
        else {
            tags.push(Tag::subclass("AcDbLayout"));
            tags.push(tag);
            return;
        };
        let end = tags[start + 1..]
            .iter()
            .position(|t| t.code == 100)
            .map_or(tags.len(), |offset| start + 1 + offset);
        match tags[start + 1..end].iter().position(|t| t.code == tag.code) {
            Some(offset) => tags[start + 1 + offset] = tag,
            None => tags.insert(end, tag),
        }
    }
}

impl<T: Deref<Target = TagGroup>> ImageDef<T> {
    pub const FILENAME: i32 = 1;
    pub const SIZE: i32 = 10;

    pub fn filename(&self) -> &str {
        self.group.get_str(Self::FILENAME).unwrap_or("")
    }

    /// Image size in pixels
    pub fn size_in_pixel(&self) -> Vector2 {
        self.group.point(Self::SIZE).unwrap_or_default().xy()
    }
}

/// Underlay file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnderlayFormat {
    Pdf,
    Dwf,
    Dgn,
}

impl UnderlayFormat {
    /// Format from a file extension (`pdf`, `dwf`, `dwfx`, `dgn`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(UnderlayFormat::Pdf),
            "dwf" | "dwfx" => Some(UnderlayFormat::Dwf),
            "dgn" => Some(UnderlayFormat::Dgn),
            _ => None,
        }
    }

    /// Format from a file name's extension.
    pub fn from_filename(filename: &str) -> Result<Self> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                DxfError::InvalidOperation(format!("unknown underlay format: '{}'", filename))
            })
    }

    /// Type label of the definition object
    pub fn definition_type(&self) -> &'static str {
        match self {
            UnderlayFormat::Pdf => "PDFDEFINITION",
            UnderlayFormat::Dwf => "DWFDEFINITION",
            UnderlayFormat::Dgn => "DGNDEFINITION",
        }
    }

    /// Type label of the referencing entity
    pub fn entity_type(&self) -> &'static str {
        match self {
            UnderlayFormat::Pdf => "PDFUNDERLAY",
            UnderlayFormat::Dwf => "DWFUNDERLAY",
            UnderlayFormat::Dgn => "DGNUNDERLAY",
        }
    }

    /// Root dictionary entry collecting definitions of this format
    pub fn dictionary_name(&self) -> &'static str {
        match self {
            UnderlayFormat::Pdf => "ACAD_PDFDEFINITIONS",
            UnderlayFormat::Dwf => "ACAD_DWFDEFINITIONS",
            UnderlayFormat::Dgn => "ACAD_DGNDEFINITIONS",
        }
    }

    pub(crate) fn from_definition_type(dxftype: &str) -> Option<Self> {
        match dxftype {
            "PDFDEFINITION" => Some(UnderlayFormat::Pdf),
            "DWFDEFINITION" => Some(UnderlayFormat::Dwf),
            "DGNDEFINITION" => Some(UnderlayFormat::Dgn),
            _ => None,
        }
    }
}

impl<T: Deref<Target = TagGroup>> UnderlayDef<T> {
    pub fn filename(&self) -> &str {
        self.group.get_str(1).unwrap_or("")
    }

    /// Sheet or page name inside the file
    pub fn name(&self) -> &str {
        self.group.get_str(2).unwrap_or("")
    }

    pub fn format(&self) -> Option<UnderlayFormat> {
        UnderlayFormat::from_definition_type(self.group.dxftype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Schema;

    #[test]
    fn test_dictionary_entries() {
        let mut group = TagGroup::with_tags("DICTIONARY", [Tag::subclass("AcDbDictionary")]);
        let mut dict = Dictionary::new(&mut group, Schema::Extended);
        dict.set("ACAD_GROUP", Handle::new(0xD));
        dict.set("ACAD_LAYOUT", Handle::new(0x1A));
        assert_eq!(dict.get("acad_group"), Some(Handle::new(0xD)));
        dict.set("ACAD_GROUP", Handle::new(0xE));
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.remove("ACAD_GROUP"), Some(Handle::new(0xE)));
        assert_eq!(dict.entries(), vec![("ACAD_LAYOUT".to_string(), Handle::new(0x1A))]);
    }

    #[test]
    fn test_group_members() {
        let mut group = TagGroup::with_tags(
            "GROUP",
            [Tag::subclass("AcDbGroup"), Tag::string(300, ""), Tag::int(70, 0), Tag::int(71, 1)],
        );
        let mut view = Group::new(&mut group, Schema::Extended);
        view.set_handles(&[Handle::new(1), Handle::new(2), Handle::new(3)]);
        assert_eq!(view.retain(|h| h != Handle::new(2)), 1);
        assert_eq!(view.handles(), vec![Handle::new(1), Handle::new(3)]);
        assert!(view.is_selectable());
    }

    #[test]
    fn test_layout_object_subclass_tags() {
        let mut group = TagGroup::with_tags(
            "LAYOUT",
            [
                Tag::handle(5, Handle::new(0x22)),
                Tag::handle(330, Handle::new(0x1A)),
                Tag::subclass("AcDbPlotSettings"),
                Tag::string(1, ""),
                Tag::subclass("AcDbLayout"),
                Tag::string(1, "Model"),
                Tag::int(71, 0),
                Tag::handle(330, Handle::new(0x1F)),
            ],
        );
        let mut layout = LayoutObject::new(&mut group, Schema::Extended);
        assert_eq!(layout.name(), "Model");
        assert_eq!(layout.block_record(), Handle::new(0x1F));
        layout.set_name("Sheet");
        layout.set_tab_order(3);
        assert_eq!(layout.name(), "Sheet");
        assert_eq!(layout.tab_order(), 3);
        assert_eq!(group.owner(), Some(Handle::new(0x1A)));
    }

    #[test]
    fn test_underlay_format() {
        assert_eq!(UnderlayFormat::from_filename("sheet.PDF").unwrap(), UnderlayFormat::Pdf);
        assert_eq!(UnderlayFormat::from_filename("a.dwfx").unwrap(), UnderlayFormat::Dwf);
        assert!(UnderlayFormat::from_filename("a.png").is_err());
    }
}
