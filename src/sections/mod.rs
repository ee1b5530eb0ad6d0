//! Sections container: loading and writing of the top-level sections

pub mod blocks;
pub mod classes;
pub mod entities;
pub mod header;
mod loader;
pub mod objects;
pub mod tables;

pub use blocks::{BlockLayout, BlocksSection};
pub use classes::ClassesSection;
pub use entities::EntitiesSection;
pub use header::HeaderSection;
pub(crate) use loader::{load, LoadedSections};
pub use objects::ObjectsSection;
pub use tables::{Table, TablesSection};

use crate::database::{EntityDb, TagGroup};
use crate::error::Result;
use crate::io::dxf::{Tag, TagWriter, TagWriterExt};
use crate::types::Handle;

/// A section the engine does not interpret, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    pub name: String,
    pub tags: Vec<Tag>,
}

impl RawSection {
    pub fn write<W: TagWriter + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_section_start(&self.name)?;
        w.write_tags(&self.tags)?;
        w.write_section_end()
    }
}

/// Write an entity followed by its VERTEX/ATTRIB/SEQEND followers.
pub(crate) fn write_entity<W: TagWriter + ?Sized>(
    db: &EntityDb,
    handle: Handle,
    w: &mut W,
) -> Result<()> {
    w.write_tags(db.get(handle)?.tags())?;
    for follower in db.followers(handle) {
        w.write_tags(db.get(*follower)?.tags())?;
    }
    Ok(())
}

/// Split section content into groups at every structure tag.
pub(crate) fn split_groups(tags: Vec<Tag>) -> Result<Vec<TagGroup>> {
    let mut groups = Vec::new();
    let mut current: Vec<Tag> = Vec::new();
    for tag in tags {
        if tag.code == 0 && !current.is_empty() {
            groups.push(TagGroup::from_tags(std::mem::take(&mut current))?);
        }
        current.push(tag);
    }
    if !current.is_empty() {
        groups.push(TagGroup::from_tags(current)?);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_groups() {
        let groups = split_groups(vec![
            Tag::structure("LINE"),
            Tag::string(8, "0"),
            Tag::structure("CIRCLE"),
            Tag::float(40, 1.0),
        ])
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].dxftype(), "CIRCLE");
    }

    #[test]
    fn test_split_groups_rejects_leading_attribute_tags() {
        assert!(split_groups(vec![Tag::string(8, "0"), Tag::structure("LINE")]).is_err());
    }

    #[test]
    fn test_raw_section_round_trip() {
        let section = RawSection {
            name: "THUMBNAILIMAGE".to_string(),
            tags: vec![Tag::int(90, 0)],
        };
        let mut tags: Vec<Tag> = Vec::new();
        section.write(&mut tags).unwrap();
        assert_eq!(tags.len(), 4);
        assert_eq!(tags[1], Tag::string(2, "THUMBNAILIMAGE"));
    }
}
