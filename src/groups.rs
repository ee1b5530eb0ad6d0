//! Named entity groups (GROUP objects of the `ACAD_GROUP` dictionary)

use tracing::{debug, info};

use crate::database::TagGroup;
use crate::document::Document;
use crate::error::{DxfError, Result};
use crate::factory::{Dictionary, Group};
use crate::naming::MAX_SUFFIX;
use crate::types::Handle;

const GROUP_DICT: &str = "ACAD_GROUP";

/// Groups of a document, read only
#[derive(Debug)]
pub struct Groups<'a> {
    doc: &'a Document,
    dict: Handle,
}

impl<'a> Groups<'a> {
    fn entries(&self) -> Vec<(String, Handle)> {
        let schema = self.doc.factory.schema();
        self.doc
            .db
            .get(self.dict)
            .map(|group| Dictionary::new(group, schema).entries())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries().into_iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handle(name).is_some()
    }

    fn handle(&self, name: &str) -> Option<Handle> {
        let schema = self.doc.factory.schema();
        let dict = self.doc.db.get(self.dict).ok()?;
        Dictionary::new(dict, schema).get(name)
    }

    pub fn get(&self, name: &str) -> Result<Group<&'a TagGroup>> {
        let handle = self
            .handle(name)
            .ok_or_else(|| DxfError::not_found("group", name))?;
        Ok(Group::new(self.doc.db.get(handle)?, self.doc.factory.schema()))
    }

    /// Names of the groups `entity` belongs to
    pub fn groups_of(&self, entity: Handle) -> Vec<String> {
        let schema = self.doc.factory.schema();
        self.entries()
            .into_iter()
            .filter(|(_, handle)| {
                self.doc
                    .db
                    .get(*handle)
                    .map_or(false, |g| Group::new(g, schema).contains(entity))
            })
            .map(|(name, _)| name)
            .collect()
    }
}

/// Creating, changing and deleting groups
#[derive(Debug)]
pub struct GroupsMut<'a> {
    doc: &'a mut Document,
    dict: Handle,
}

impl GroupsMut<'_> {
    /// Create a group of `members`; `None` as name creates an unnamed
    /// group called `*A1`, `*A2`, ...
    pub fn new(
        &mut self,
        name: Option<&str>,
        members: &[Handle],
        description: &str,
        selectable: bool,
    ) -> Result<String> {
        let name = match name {
            Some(name) => {
                if self.read().contains(name) {
                    return Err(DxfError::duplicate("group", name));
                }
                name.to_string()
            }
            None => self.unnamed_name()?,
        };
        self.check_members(members)?;
        let unnamed = name.starts_with('*');
        let mut group = self.doc.factory.new_group(description, unnamed, selectable)?;
        Group::new(&mut group, self.doc.factory.schema()).set_handles(members);
        let handle = self.doc.add_object(group, self.dict);
        self.doc.set_dict_entry(self.dict, &name, handle)?;
        info!(group = %name, members = members.len(), "group created");
        Ok(name)
    }

    /// Replace the members of group `name`.
    pub fn set_members(&mut self, name: &str, members: &[Handle]) -> Result<()> {
        let handle = self
            .read()
            .handle(name)
            .ok_or_else(|| DxfError::not_found("group", name))?;
        self.check_members(members)?;
        let schema = self.doc.factory.schema();
        Group::new(self.doc.db.get_mut(handle)?, schema).set_handles(members);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let schema = self.doc.factory.schema();
        let handle = Dictionary::new(self.doc.db.get_mut(self.dict)?, schema)
            .remove(name)
            .ok_or_else(|| DxfError::not_found("group", name))?;
        self.doc.objects.remove(handle);
        self.doc.db.remove(handle)?;
        debug!(group = name, "group deleted");
        Ok(())
    }

    fn read(&self) -> Groups<'_> {
        Groups {
            doc: self.doc,
            dict: self.dict,
        }
    }

    fn unnamed_name(&self) -> Result<String> {
        let groups = self.read();
        (1..MAX_SUFFIX)
            .map(|n| format!("*A{}", n))
            .find(|candidate| !groups.contains(candidate))
            .ok_or_else(|| DxfError::InvalidOperation("no free unnamed group name".to_string()))
    }

    /// Members must be entities placed in a block.
    fn check_members(&self, members: &[Handle]) -> Result<()> {
        for handle in members {
            if !self.doc.db.contains(*handle) {
                return Err(DxfError::HandleNotFound(*handle));
            }
            if self.doc.blocks.owner_of(*handle).is_none() {
                return Err(DxfError::InvalidOperation(format!(
                    "{:X} is not an entity of a block",
                    handle
                )));
            }
        }
        Ok(())
    }
}

impl Document {
    /// Groups of an extended document.
    pub fn groups(&self) -> Result<Groups<'_>> {
        self.factory.require_extended("groups")?;
        let dict = self
            .rootdict_entry(GROUP_DICT)
            .ok_or_else(|| DxfError::not_found("dictionary", GROUP_DICT))?;
        Ok(Groups { doc: self, dict })
    }

    pub fn groups_mut(&mut self) -> Result<GroupsMut<'_>> {
        self.factory.require_extended("groups")?;
        let (dict, _) = self.ensure_root_dict(GROUP_DICT)?;
        Ok(GroupsMut { doc: self, dict })
    }
}

/// Drop group members that no longer exist or left their block, then
/// empty groups. Returns the number of removed members and groups.
pub(crate) fn cleanup(doc: &mut Document) -> Result<usize> {
    if doc.is_legacy() {
        return Ok(0);
    }
    let Some(dict) = doc.rootdict_entry(GROUP_DICT) else {
        return Ok(0);
    };
    let schema = doc.factory.schema();
    let entries = Dictionary::new(doc.db.get(dict)?, schema).entries();
    let mut removed = 0;
    let mut empty = Vec::new();
    for (name, handle) in entries {
        if !doc.db.contains(handle) {
            Dictionary::new(doc.db.get_mut(dict)?, schema).remove(&name);
            removed += 1;
            continue;
        }
        let members = Group::new(doc.db.get(handle)?, schema).handles();
        let alive: Vec<Handle> = members
            .iter()
            .copied()
            .filter(|h| doc.db.contains(*h) && doc.blocks.owner_of(*h).is_some())
            .collect();
        if alive.len() != members.len() {
            removed += members.len() - alive.len();
            Group::new(doc.db.get_mut(handle)?, schema).set_handles(&alive);
        }
        if alive.is_empty() {
            empty.push(name);
        }
    }
    let mut groups = GroupsMut { doc, dict };
    for name in &empty {
        groups.delete(name)?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::GraphicAttribs;
    use crate::layouts::EntitySpaceMut;
    use crate::types::{DxfVersion, Vector3};

    fn doc_with_lines(n: usize) -> (Document, Vec<Handle>) {
        let mut doc = Document::new(DxfVersion::AC1015).unwrap();
        let mut msp = doc.modelspace_mut();
        let lines = (0..n)
            .map(|i| {
                msp.add_line(
                    Vector3::new(i as f64, 0.0, 0.0),
                    Vector3::new(i as f64, 1.0, 0.0),
                    &GraphicAttribs::default(),
                )
                .unwrap()
            })
            .collect();
        (doc, lines)
    }

    #[test]
    fn test_groups_require_extended() {
        let mut doc = Document::new(DxfVersion::AC1009).unwrap();
        assert!(matches!(doc.groups(), Err(DxfError::UnsupportedRevision { .. })));
        assert!(matches!(doc.groups_mut(), Err(DxfError::UnsupportedRevision { .. })));
    }

    #[test]
    fn test_named_and_unnamed_groups() {
        let (mut doc, lines) = doc_with_lines(3);
        let mut groups = doc.groups_mut().unwrap();
        groups.new(Some("FRAME"), &lines[..2], "frame lines", true).unwrap();
        assert_eq!(groups.new(None, &lines[2..], "", true).unwrap(), "*A1");
        assert!(matches!(
            groups.new(Some("frame"), &lines, "", true),
            Err(DxfError::Duplicate { .. })
        ));
        assert!(groups.new(Some("BAD"), &[Handle::new(0xFFFF)], "", true).is_err());

        let groups = doc.groups().unwrap();
        assert_eq!(groups.names(), vec!["FRAME", "*A1"]);
        let frame = groups.get("FRAME").unwrap();
        assert_eq!(frame.handles(), lines[..2].to_vec());
        assert_eq!(frame.description(), "frame lines");
        assert!(doc.groups().unwrap().get("*A1").unwrap().is_unnamed());
        assert_eq!(doc.groups().unwrap().groups_of(lines[0]), vec!["FRAME"]);
    }

    #[test]
    fn test_cleanup_prunes_deleted_members() {
        let (mut doc, lines) = doc_with_lines(3);
        {
            let mut groups = doc.groups_mut().unwrap();
            groups.new(Some("ALL"), &lines, "", true).unwrap();
            groups.new(Some("FIRST"), &lines[..1], "", true).unwrap();
        }
        doc.modelspace_mut().delete_entity(lines[0]).unwrap();
        // one member of ALL, one of FIRST, then the empty FIRST group
        assert_eq!(doc.cleanup(true).unwrap(), 3);
        let groups = doc.groups().unwrap();
        assert_eq!(groups.names(), vec!["ALL"]);
        assert_eq!(groups.get("ALL").unwrap().len(), 2);
        assert_eq!(doc.cleanup(true).unwrap(), 0);
    }
}
