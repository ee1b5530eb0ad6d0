//! Tag groups: the ordered tags of one logical object

use crate::error::{DxfError, Result};
use crate::io::dxf::{is_pointer_code, Tag, TagValue};
use crate::types::{Handle, Vector2, Vector3};

/// Ordered tags of one entity, table record or object.
///
/// The first tag is always `0 <type>`. Lookups skip application data
/// blocks (`102 {NAME` ... `102 }`), so reactor pointers are never
/// mistaken for the owner or for attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TagGroup {
    tags: Vec<Tag>,
}

impl TagGroup {
    /// Build a group from tags read from a stream.
    pub fn from_tags(tags: Vec<Tag>) -> Result<Self> {
        match tags.first() {
            Some(tag) if tag.code == 0 && tag.as_str().is_some() => Ok(Self { tags }),
            Some(tag) => Err(DxfError::Structural(format!(
                "tag group must start with a structure tag, found {}",
                tag
            ))),
            None => Err(DxfError::Structural("empty tag group".to_string())),
        }
    }

    /// New group containing only `0 <dxftype>`.
    pub fn new(dxftype: &str) -> Self {
        Self {
            tags: vec![Tag::structure(dxftype)],
        }
    }

    /// New group `0 <dxftype>` followed by `tags`.
    pub fn with_tags(dxftype: &str, tags: impl IntoIterator<Item = Tag>) -> Self {
        let mut group = Self::new(dxftype);
        group.tags.extend(tags);
        group
    }

    /// Type label, the value of the leading `0` tag.
    pub fn dxftype(&self) -> &str {
        self.tags[0].as_str().unwrap_or_default()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }

    pub fn into_tags(self) -> Vec<Tag> {
        self.tags
    }

    pub fn push(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    pub fn extend(&mut self, tags: impl IntoIterator<Item = Tag>) {
        self.tags.extend(tags);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.len() <= 1
    }

    /// Group code carrying this group's handle.
    pub fn handle_code(&self) -> i32 {
        if self.dxftype() == "DIMSTYLE" {
            105
        } else {
            5
        }
    }

    /// Handle tag value, if the group carries one.
    pub fn handle(&self) -> Option<Handle> {
        let code = self.handle_code();
        self.get(code).and_then(Tag::as_handle).filter(Handle::is_valid)
    }

    /// Set the handle, inserting the tag right after the type (and the
    /// table name for `TABLE` heads) if it is missing.
    pub fn set_handle(&mut self, handle: Handle) {
        let code = self.handle_code();
        if let Some(index) = self.position(code) {
            self.tags[index] = Tag::handle(code, handle);
            return;
        }
        let index = if self.dxftype() == "TABLE" && self.tags.get(1).map_or(false, |t| t.code == 2) {
            2
        } else {
            1
        };
        self.tags.insert(index, Tag::handle(code, handle));
    }

    /// Owner handle: the first `330` before any subclass marker.
    pub fn owner(&self) -> Option<Handle> {
        self.owner_position()
            .and_then(|index| self.tags[index].as_handle())
    }

    /// Set the owner, inserting it after the handle and any application
    /// data blocks that follow the handle.
    pub fn set_owner(&mut self, owner: Handle) {
        if let Some(index) = self.owner_position() {
            self.tags[index] = Tag::handle(330, owner);
            return;
        }
        let mut index = self.position(self.handle_code()).map_or(1, |i| i + 1);
        let mut in_app_data = false;
        while index < self.tags.len() {
            let tag = &self.tags[index];
            if tag.code == 102 {
                in_app_data = tag.as_str().map_or(false, |s| s.starts_with('{'));
            } else if !in_app_data {
                break;
            }
            index += 1;
        }
        self.tags.insert(index, Tag::handle(330, owner));
    }

    fn owner_position(&self) -> Option<usize> {
        self.visible()
            .take_while(|(_, tag)| tag.code != 100)
            .find(|(_, tag)| tag.code == 330)
            .map(|(index, _)| index)
    }

    /// Indexed tags outside of application data blocks, skipping the type tag.
    fn visible(&self) -> impl Iterator<Item = (usize, &Tag)> + '_ {
        let mut in_app_data = false;
        self.tags.iter().enumerate().skip(1).filter(move |(_, tag)| {
            if tag.code == 102 {
                in_app_data = tag.as_str().map_or(false, |s| s.starts_with('{'));
                return false;
            }
            !in_app_data
        })
    }

    /// Index of the first visible tag with `code`.
    pub fn position(&self, code: i32) -> Option<usize> {
        self.visible()
            .find(|(_, tag)| tag.code == code)
            .map(|(index, _)| index)
    }

    /// First visible tag with `code`.
    pub fn get(&self, code: i32) -> Option<&Tag> {
        self.position(code).map(|index| &self.tags[index])
    }

    /// Every visible tag with `code`, in order.
    pub fn get_all(&self, code: i32) -> impl Iterator<Item = &Tag> + '_ {
        self.visible()
            .filter(move |(_, tag)| tag.code == code)
            .map(|(_, tag)| tag)
    }

    pub fn contains(&self, code: i32) -> bool {
        self.position(code).is_some()
    }

    pub fn get_str(&self, code: i32) -> Option<&str> {
        self.get(code).and_then(Tag::as_str)
    }

    pub fn get_int(&self, code: i32) -> Option<i64> {
        self.get(code).and_then(Tag::as_int)
    }

    pub fn get_float(&self, code: i32) -> Option<f64> {
        self.get(code).and_then(Tag::as_float)
    }

    pub fn get_handle(&self, code: i32) -> Option<Handle> {
        self.get(code).and_then(Tag::as_handle)
    }

    /// Replace the first visible tag with `code`, or append it.
    pub fn set(&mut self, code: i32, value: TagValue) {
        let tag = Tag::new(code, value);
        match self.position(code) {
            Some(index) => self.tags[index] = tag,
            None => self.tags.push(tag),
        }
    }

    pub fn set_str(&mut self, code: i32, value: &str) {
        self.set(code, TagValue::Str(value.to_string()));
    }

    pub fn set_int(&mut self, code: i32, value: i64) {
        self.set(code, TagValue::Int(value));
    }

    pub fn set_float(&mut self, code: i32, value: f64) {
        self.set(code, TagValue::Float(value));
    }

    pub fn set_handle_value(&mut self, code: i32, value: Handle) {
        self.set(code, TagValue::Handle(value));
    }

    /// Insert `tag` before the first visible tag with `before`, or append.
    pub fn insert_before(&mut self, before: i32, tag: Tag) {
        match self.position(before) {
            Some(index) => self.tags.insert(index, tag),
            None => self.tags.push(tag),
        }
    }

    /// Remove every visible tag with `code`; returns true if any was removed.
    pub fn remove(&mut self, code: i32) -> bool {
        let doomed: Vec<usize> = self
            .visible()
            .filter(|(_, tag)| tag.code == code)
            .map(|(index, _)| index)
            .collect();
        for index in doomed.iter().rev() {
            self.tags.remove(*index);
        }
        !doomed.is_empty()
    }

    /// Point stored at `code`, `code + 10` and an optional `code + 20`.
    pub fn point(&self, code: i32) -> Option<Vector3> {
        let index = self.position(code)?;
        let x = self.tags[index].as_float()?;
        let y = self
            .tags
            .get(index + 1)
            .filter(|t| t.code == code + 10)
            .and_then(Tag::as_float)?;
        let z = self
            .tags
            .get(index + 2)
            .filter(|t| t.code == code + 20)
            .and_then(Tag::as_float)
            .unwrap_or(0.0);
        Some(Vector3::new(x, y, z))
    }

    /// Set a point in place, or append all three coordinates.
    pub fn set_point(&mut self, code: i32, p: Vector3) {
        let Some(index) = self.position(code) else {
            self.tags.extend(Tag::point(code, p));
            return;
        };
        self.tags[index] = Tag::float(code, p.x);
        let has_code_at = |tags: &[Tag], i: usize, c: i32| tags.get(i).map_or(false, |t| t.code == c);
        if has_code_at(&self.tags, index + 1, code + 10) {
            self.tags[index + 1] = Tag::float(code + 10, p.y);
        } else {
            self.tags.insert(index + 1, Tag::float(code + 10, p.y));
        }
        if has_code_at(&self.tags, index + 2, code + 20) {
            self.tags[index + 2] = Tag::float(code + 20, p.z);
        } else if p.z != 0.0 {
            self.tags.insert(index + 2, Tag::float(code + 20, p.z));
        }
    }

    /// Every `code`/`code + 10` pair, e.g. lightweight polyline vertices.
    pub fn points2d(&self, code: i32) -> Vec<Vector2> {
        let mut points = Vec::new();
        let mut x = None;
        for (_, tag) in self.visible() {
            if tag.code == code {
                x = tag.as_float();
            } else if tag.code == code + 10 {
                if let (Some(px), Some(py)) = (x.take(), tag.as_float()) {
                    points.push(Vector2::new(px, py));
                }
            }
        }
        points
    }

    /// Tags of subclass `name`, up to the next subclass marker.
    pub fn subclass(&self, name: &str) -> Option<&[Tag]> {
        let start = self
            .tags
            .iter()
            .position(|t| t.code == 100 && t.as_str() == Some(name))?
            + 1;
        let end = self.tags[start..]
            .iter()
            .position(|t| t.code == 100)
            .map_or(self.tags.len(), |offset| start + offset);
        Some(&self.tags[start..end])
    }

    /// Extended (R13+) groups carry subclass markers.
    pub fn has_subclass_markers(&self) -> bool {
        self.tags.iter().any(|t| t.code == 100)
    }

    /// Every pointer tag (owner, reactors, soft/hard pointers) with its index.
    pub fn pointers(&self) -> impl Iterator<Item = (usize, Handle)> + '_ {
        self.tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| is_pointer_code(tag.code))
            .filter_map(|(index, tag)| tag.as_handle().map(|h| (index, h)))
    }

    /// Rewrite pointer tags through `map`; pointers `map` returns `None`
    /// for are removed. Returns the number of removed tags.
    pub fn remap_pointers<F>(&mut self, mut map: F) -> usize
    where
        F: FnMut(Handle) -> Option<Handle>,
    {
        let before = self.tags.len();
        let mut kept = Vec::with_capacity(before);
        for tag in self.tags.drain(..) {
            if !is_pointer_code(tag.code) {
                kept.push(tag);
                continue;
            }
            match tag.as_handle() {
                Some(h) if h.is_null() => kept.push(tag),
                Some(h) => {
                    if let Some(new) = map(h) {
                        kept.push(Tag::handle(tag.code, new));
                    }
                }
                None => kept.push(tag),
            }
        }
        self.tags = kept;
        before - self.tags.len()
    }

    /// Remove all application data blocks (`102 {...` to `102 }`).
    pub fn strip_app_data(&mut self) {
        let mut in_app_data = false;
        self.tags.retain(|tag| {
            if tag.code == 102 {
                in_app_data = tag.as_str().map_or(false, |s| s.starts_with('{'));
                return false;
            }
            !in_app_data
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_group() -> TagGroup {
        TagGroup::from_tags(vec![
            Tag::structure("LINE"),
            Tag::handle(5, Handle::new(0x2A)),
            Tag::string(102, "{ACAD_REACTORS"),
            Tag::handle(330, Handle::new(0x99)),
            Tag::string(102, "}"),
            Tag::handle(330, Handle::new(0x1F)),
            Tag::subclass("AcDbEntity"),
            Tag::string(8, "0"),
            Tag::subclass("AcDbLine"),
            Tag::float(10, 1.0),
            Tag::float(20, 2.0),
            Tag::float(30, 0.0),
            Tag::float(11, 3.0),
            Tag::float(21, 4.0),
            Tag::float(31, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_tags_requires_structure_tag() {
        assert!(TagGroup::from_tags(vec![Tag::int(70, 1)]).is_err());
        assert!(TagGroup::from_tags(Vec::new()).is_err());
    }

    #[test]
    fn test_handle_and_owner_skip_app_data() {
        let group = line_group();
        assert_eq!(group.dxftype(), "LINE");
        assert_eq!(group.handle(), Some(Handle::new(0x2A)));
        assert_eq!(group.owner(), Some(Handle::new(0x1F)));
    }

    #[test]
    fn test_set_owner_inserts_after_handle() {
        let mut group = TagGroup::with_tags("LINE", [Tag::subclass("AcDbEntity")]);
        group.set_handle(Handle::new(0x10));
        group.set_owner(Handle::new(0x1F));
        assert_eq!(group.tags()[1], Tag::handle(5, Handle::new(0x10)));
        assert_eq!(group.tags()[2], Tag::handle(330, Handle::new(0x1F)));
    }

    #[test]
    fn test_dimstyle_and_table_handles() {
        let mut dimstyle = TagGroup::with_tags("DIMSTYLE", [Tag::string(2, "STANDARD")]);
        dimstyle.set_handle(Handle::new(0x27));
        assert_eq!(dimstyle.tags()[1].code, 105);

        let mut table = TagGroup::with_tags("TABLE", [Tag::string(2, "LAYER")]);
        table.set_handle(Handle::new(2));
        assert_eq!(table.tags()[2], Tag::handle(5, Handle::new(2)));
    }

    #[test]
    fn test_points() {
        let mut group = line_group();
        assert_eq!(group.point(10), Some(Vector3::new(1.0, 2.0, 0.0)));
        group.set_point(11, Vector3::new(7.0, 8.0, 9.0));
        assert_eq!(group.point(11), Some(Vector3::new(7.0, 8.0, 9.0)));
        assert_eq!(group.point(12), None);
    }

    #[test]
    fn test_subclass_slice() {
        let group = line_group();
        let line = group.subclass("AcDbLine").unwrap();
        assert_eq!(line.len(), 6);
        assert_eq!(group.subclass("AcDbEntity").unwrap(), &[Tag::string(8, "0")]);
    }

    #[test]
    fn test_remap_pointers() {
        let mut group = line_group();
        let removed = group.remap_pointers(|h| (h == Handle::new(0x1F)).then(|| Handle::new(0x50)));
        assert_eq!(removed, 1);
        assert_eq!(group.owner(), Some(Handle::new(0x50)));
    }

    #[test]
    fn test_strip_app_data() {
        let mut group = line_group();
        group.strip_app_data();
        assert!(group.get_all(102).next().is_none());
        assert_eq!(group.pointers().count(), 1);
    }
}
