//! HEADER section: `$VARIABLE` name to value tags

use indexmap::IndexMap;

use crate::error::Result;
use crate::io::dxf::{Tag, TagValue, TagWriter, TagWriterExt};
use crate::types::{DxfVersion, Handle, Vector3};

/// Header variables in file order.
///
/// A variable holds one value tag, or two/three tags for points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSection {
    vars: IndexMap<String, Vec<Tag>>,
}

impl HeaderSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the tags between `2 HEADER` and `0 ENDSEC`.
    ///
    /// Tags before the first `9` tag are ignored.
    pub fn from_tags(tags: Vec<Tag>) -> Self {
        let mut vars: IndexMap<String, Vec<Tag>> = IndexMap::new();
        let mut current: Option<String> = None;
        for tag in tags {
            if tag.code == 9 {
                let name = tag.as_str().unwrap_or_default().to_string();
                vars.entry(name.clone()).or_default().clear();
                current = Some(name);
            } else if let Some(name) = &current {
                if let Some(values) = vars.get_mut(name) {
                    values.push(tag);
                }
            }
        }
        Self { vars }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Value tags of a variable
    pub fn get(&self, name: &str) -> Option<&[Tag]> {
        self.vars.get(name).map(Vec::as_slice)
    }

    fn first(&self, name: &str) -> Option<&Tag> {
        self.vars.get(name).and_then(|tags| tags.first())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(Tag::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.first(name).and_then(Tag::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.first(name).and_then(Tag::as_float)
    }

    pub fn get_handle(&self, name: &str) -> Option<Handle> {
        self.first(name).and_then(Tag::as_handle)
    }

    pub fn get_point(&self, name: &str) -> Option<Vector3> {
        let tags = self.vars.get(name)?;
        let coord = |i: usize| tags.get(i).and_then(Tag::as_float);
        Some(Vector3::new(coord(0)?, coord(1)?, coord(2).unwrap_or(0.0)))
    }

    /// Replace a variable's value tags.
    pub fn set(&mut self, name: &str, tags: Vec<Tag>) {
        self.vars.insert(name.to_string(), tags);
    }

    pub fn set_value(&mut self, name: &str, code: i32, value: TagValue) {
        self.set(name, vec![Tag::new(code, value)]);
    }

    pub fn set_str(&mut self, name: &str, code: i32, value: &str) {
        self.set_value(name, code, TagValue::Str(value.to_string()));
    }

    pub fn set_int(&mut self, name: &str, code: i32, value: i64) {
        self.set_value(name, code, TagValue::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f64) {
        self.set_value(name, 40, TagValue::Float(value));
    }

    pub fn set_handle(&mut self, name: &str, value: Handle) {
        self.set_value(name, 5, TagValue::Handle(value));
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<Tag>> {
        self.vars.shift_remove(name)
    }

    /// Revision from `$ACADVER`; `Ok(None)` when the variable is missing.
    pub fn version(&self) -> Result<Option<DxfVersion>> {
        match self.get_str("$ACADVER") {
            Some(s) => s.parse().map(Some),
            None => Ok(None),
        }
    }

    /// Write the section, `$ACADVER` first.
    pub fn write<W: TagWriter + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_section_start("HEADER")?;
        if let Some(tags) = self.vars.get("$ACADVER") {
            w.write_string(9, "$ACADVER")?;
            w.write_tags(tags)?;
        }
        for (name, tags) in self.vars.iter().filter(|(name, _)| *name != "$ACADVER") {
            w.write_string(9, name)?;
            w.write_tags(tags)?;
        }
        w.write_section_end()
    }
}
