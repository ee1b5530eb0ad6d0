//! Stream to sections: splits the tag stream and registers every group

use encoding_rs::Encoding;
use tracing::{debug, warn};

use super::{
    split_groups, BlockLayout, BlocksSection, ClassesSection, EntitiesSection, HeaderSection,
    ObjectsSection, RawSection, Table, TablesSection,
};
use crate::database::{EntityDb, TagGroup};
use crate::error::{DxfError, Result};
use crate::io::dxf::{encoding_from_code_page, Tag, TagStream};
use crate::notification::NotificationCollection;
use crate::types::{DxfVersion, Handle};

/// Everything read from a stream, before repair.
#[derive(Debug)]
pub(crate) struct LoadedSections {
    pub comments: Vec<String>,
    pub header: HeaderSection,
    pub version: DxfVersion,
    pub encoding: &'static Encoding,
    pub classes: ClassesSection,
    pub tables: TablesSection,
    pub blocks: BlocksSection,
    pub entities: EntitiesSection,
    pub objects: ObjectsSection,
    pub unknown: Vec<RawSection>,
    pub db: EntityDb,
    pub notifications: NotificationCollection,
}

/// Read every section from `stream`.
///
/// HEADER is interpreted as soon as it is complete, so its code page
/// applies to the rest of the stream.
pub(crate) fn load<S: TagStream + ?Sized>(stream: &mut S) -> Result<LoadedSections> {
    let comments = read_comments(stream)?;
    let mut header = HeaderSection::new();
    let mut version = DxfVersion::AC1009;
    let mut encoding = encoding_rs::WINDOWS_1252;
    let mut bodies: Vec<(String, Vec<Tag>)> = Vec::new();

    while let Some(tag) = stream.read_tag()? {
        if tag.is_structure("EOF") {
            break;
        }
        if tag.code == 999 {
            continue;
        }
        if !tag.is_structure("SECTION") {
            return Err(DxfError::decode(
                stream.line_number(),
                format!("expected SECTION, found {}", tag),
            ));
        }
        let name = read_section_name(stream)?;
        let body = read_section_body(stream, &name)?;
        debug!(section = %name, tags = body.len(), "section read");
        if name == "HEADER" {
            header = HeaderSection::from_tags(body);
            version = header.version()?.unwrap_or(DxfVersion::AC1009);
            if version.is_unicode() {
                encoding = encoding_rs::UTF_8;
                stream.set_unicode_escapes(false);
            } else if let Some(code_page) = header.get_str("$DWGCODEPAGE") {
                match encoding_from_code_page(code_page) {
                    Some(enc) => {
                        encoding = enc;
                        stream.set_encoding(enc);
                    }
                    None => warn!(code_page, "unknown code page, keeping default decoding"),
                }
            }
        } else {
            bodies.push((name, body));
        }
    }

    let mut loaded = LoadedSections {
        comments,
        header,
        version,
        encoding,
        classes: ClassesSection::new(),
        tables: TablesSection::new(),
        blocks: BlocksSection::new(),
        entities: EntitiesSection::new(),
        objects: ObjectsSection::new(),
        unknown: Vec::new(),
        db: EntityDb::new(),
        notifications: NotificationCollection::new(),
    };

    let mut sections: Vec<(String, Vec<TagGroup>)> = Vec::new();
    for (name, body) in bodies {
        match name.as_str() {
            "CLASSES" | "TABLES" | "BLOCKS" | "ENTITIES" | "OBJECTS" => {
                sections.push((name, split_groups(body)?));
            }
            _ => loaded.unknown.push(RawSection { name, tags: body }),
        }
    }

    // Explicit handles win over keys allocated for handle-less groups.
    let seed = loaded.header.get_handle("$HANDSEED").unwrap_or(Handle::new(1));
    loaded.db = EntityDb::with_seed(seed);
    let max_handle = sections
        .iter()
        .flat_map(|(_, groups)| groups.iter())
        .filter_map(TagGroup::handle)
        .max();
    if let Some(max) = max_handle {
        loaded.db.reserve(max);
    }

    for (name, groups) in sections {
        match name.as_str() {
            "CLASSES" => loaded.classes = ClassesSection::from_groups(groups),
            "TABLES" => load_tables(&mut loaded, groups)?,
            "BLOCKS" => load_blocks(&mut loaded, groups)?,
            "ENTITIES" => {
                let mut collector = EntityCollector::default();
                for group in groups {
                    collector.add(&mut loaded.db, group, &mut loaded.notifications);
                }
                for handle in collector.finish(&mut loaded.db, &mut loaded.notifications) {
                    loaded.entities.push(handle);
                }
            }
            _ => {
                for group in groups {
                    let handle = loaded.db.add(group);
                    loaded.objects.push(handle);
                }
            }
        }
    }
    Ok(loaded)
}

fn read_comments<S: TagStream + ?Sized>(stream: &mut S) -> Result<Vec<String>> {
    let mut comments = Vec::new();
    while let Some(tag) = stream.read_tag()? {
        if tag.code != 999 {
            stream.push_back(tag);
            break;
        }
        comments.push(tag.as_str().unwrap_or_default().to_string());
    }
    Ok(comments)
}

fn read_section_name<S: TagStream + ?Sized>(stream: &mut S) -> Result<String> {
    match stream.read_tag()? {
        Some(tag) if tag.code == 2 => Ok(tag.as_str().unwrap_or_default().to_uppercase()),
        Some(tag) => Err(DxfError::decode(
            stream.line_number(),
            format!("expected section name, found {}", tag),
        )),
        None => Err(DxfError::decode(stream.line_number(), "missing section name")),
    }
}

fn read_section_body<S: TagStream + ?Sized>(stream: &mut S, name: &str) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();
    loop {
        match stream.read_tag()? {
            Some(tag) if tag.is_structure("ENDSEC") => return Ok(tags),
            Some(tag) => tags.push(tag),
            None => {
                return Err(DxfError::decode(
                    stream.line_number(),
                    format!("unexpected end of stream in section {}", name),
                ))
            }
        }
    }
}

fn load_tables(loaded: &mut LoadedSections, groups: Vec<TagGroup>) -> Result<()> {
    let mut current: Option<Table> = None;
    for group in groups {
        match group.dxftype() {
            "TABLE" => {
                if let Some(table) = current.take() {
                    warn!(table = table.name(), "table without ENDTAB");
                    finish_table(loaded, table)?;
                }
                let name = group.get_str(2).unwrap_or_default().to_string();
                let head = loaded.db.add(group);
                current = Some(Table::new(&name, head));
            }
            "ENDTAB" => match current.take() {
                Some(table) => finish_table(loaded, table)?,
                None => warn!("ENDTAB without TABLE ignored"),
            },
            dxftype => {
                let table = current.as_mut().ok_or_else(|| {
                    DxfError::Structural(format!("{} record outside of a TABLE", dxftype))
                })?;
                let name = group.get_str(2).unwrap_or_default().to_string();
                if table.contains(&name) {
                    warn!(table = table.name(), record = %name, "duplicate table record ignored");
                    loaded.notifications.warn(format!(
                        "duplicate {} record '{}' ignored",
                        table.name(),
                        name
                    ));
                    continue;
                }
                let handle = loaded.db.add(group);
                table.add(&name, handle)?;
            }
        }
    }
    if let Some(table) = current {
        warn!(table = table.name(), "table without ENDTAB");
        finish_table(loaded, table)?;
    }
    Ok(())
}

fn finish_table(loaded: &mut LoadedSections, table: Table) -> Result<()> {
    let Some(existing) = loaded.tables.get_mut(table.name()) else {
        return loaded.tables.insert(table);
    };
    // A second TABLE of the same name: merge its records into the first.
    loaded
        .notifications
        .warn(format!("duplicate table {} merged", table.name()));
    for (name, handle) in table.entries() {
        if existing.add(name, handle).is_err() {
            loaded.db.remove(handle)?;
        }
    }
    loaded.db.remove(table.head())?;
    Ok(())
}

fn load_blocks(loaded: &mut LoadedSections, groups: Vec<TagGroup>) -> Result<()> {
    let mut current: Option<(String, Handle, EntityCollector)> = None;
    for group in groups {
        match group.dxftype() {
            "BLOCK" => {
                if let Some((name, _, _)) = &current {
                    return Err(DxfError::Structural(format!(
                        "BLOCK inside of block definition '{}'",
                        name
                    )));
                }
                let name = group.get_str(2).unwrap_or_default().to_string();
                let block = loaded.db.add(group);
                current = Some((name, block, EntityCollector::default()));
            }
            "ENDBLK" => {
                let (name, block, collector) = current.take().ok_or_else(|| {
                    DxfError::Structural("ENDBLK without BLOCK".to_string())
                })?;
                let endblk = loaded.db.add(group);
                let mut layout = BlockLayout::new(&name, block, endblk, Handle::NULL);
                layout.entities = collector.finish(&mut loaded.db, &mut loaded.notifications);
                if loaded.blocks.contains_name(&name) {
                    warn!(block = %name, "duplicate block definition ignored");
                    loaded
                        .notifications
                        .warn(format!("duplicate block definition '{}' ignored", name));
                    for handle in layout.entities.iter().chain([&block, &endblk]) {
                        loaded.db.remove(*handle)?;
                    }
                    continue;
                }
                loaded.blocks.insert(layout)?;
            }
            dxftype => {
                let (_, _, collector) = current.as_mut().ok_or_else(|| {
                    DxfError::Structural(format!("{} outside of a block definition", dxftype))
                })?;
                collector.add(&mut loaded.db, group, &mut loaded.notifications);
            }
        }
    }
    if let Some((name, _, _)) = current {
        return Err(DxfError::Structural(format!(
            "block definition '{}' without ENDBLK",
            name
        )));
    }
    Ok(())
}

/// Registers entities, attaching VERTEX/ATTRIB ... SEQEND chains to the
/// POLYLINE or INSERT they follow.
#[derive(Debug, Default)]
struct EntityCollector {
    mains: Vec<Handle>,
    chain: Option<(Handle, &'static str, Vec<Handle>)>,
}

impl EntityCollector {
    fn add(&mut self, db: &mut EntityDb, group: TagGroup, notes: &mut NotificationCollection) {
        if let Some((main, follower_type, followers)) = self.chain.as_mut() {
            let dxftype = group.dxftype();
            if dxftype == *follower_type {
                followers.push(db.add(group));
                return;
            }
            if dxftype == "SEQEND" {
                followers.push(db.add(group));
                let main = *main;
                let followers = std::mem::take(followers);
                db.set_followers(main, followers);
                self.chain = None;
                return;
            }
            self.close_chain(db, notes);
        }

        let follower_type = match group.dxftype() {
            "POLYLINE" => Some("VERTEX"),
            "INSERT" if group.get_int(66) == Some(1) => Some("ATTRIB"),
            _ => None,
        };
        let handle = db.add(group);
        self.mains.push(handle);
        if let Some(follower_type) = follower_type {
            self.chain = Some((handle, follower_type, Vec::new()));
        }
    }

    fn close_chain(&mut self, db: &mut EntityDb, notes: &mut NotificationCollection) {
        if let Some((main, _, followers)) = self.chain.take() {
            warn!(entity = %main, "follower chain without SEQEND");
            notes.warn(format!("entity {:X}: follower chain without SEQEND", main));
            db.set_followers(main, followers);
        }
    }

    fn finish(mut self, db: &mut EntityDb, notes: &mut NotificationCollection) -> Vec<Handle> {
        self.close_chain(db, notes);
        self.mains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dxf::DxfTextReader;

    fn load_str(text: &str) -> Result<LoadedSections> {
        let mut reader = DxfTextReader::new(text.as_bytes());
        load(&mut reader)
    }

    const LEGACY: &str = "999\nwritten by hand\n  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1009\n  0\nENDSEC\n  0\nSECTION\n  2\nTABLES\n  0\nTABLE\n  2\nLAYER\n 70\n2\n  0\nLAYER\n  2\nWALLS\n 70\n0\n  0\nLAYER\n  2\nwalls\n 70\n0\n  0\nENDTAB\n  0\nENDSEC\n  0\nSECTION\n  2\nENTITIES\n  0\nPOLYLINE\n  8\nWALLS\n 66\n1\n  0\nVERTEX\n  8\nWALLS\n  0\nVERTEX\n  8\nWALLS\n  0\nSEQEND\n  8\nWALLS\n  0\nLINE\n  8\n0\n  0\nENDSEC\n  0\nEOF\n";

    #[test]
    fn test_load_legacy_without_handles() {
        let loaded = load_str(LEGACY).unwrap();
        assert_eq!(loaded.comments, vec!["written by hand".to_string()]);
        assert_eq!(loaded.version, DxfVersion::AC1009);
        assert_eq!(loaded.entities.pending().len(), 2);
        let polyline = loaded.entities.pending()[0];
        assert_eq!(loaded.db.followers(polyline).len(), 3);
        // head, one layer, polyline with 3 followers, line
        assert_eq!(loaded.db.len(), 7);
    }

    #[test]
    fn test_duplicate_layer_keeps_first() {
        let loaded = load_str(LEGACY).unwrap();
        let layers = loaded.tables.get("LAYER").unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(loaded.notifications.len(), 1);
    }

    #[test]
    fn test_unterminated_section_is_a_decode_error() {
        let text = "  0\nSECTION\n  2\nENTITIES\n  0\nLINE\n  8\n0\n";
        assert!(matches!(load_str(text), Err(DxfError::Decode { .. })));
    }

    #[test]
    fn test_unknown_version() {
        let text = "  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC2099\n  0\nENDSEC\n  0\nEOF\n";
        assert!(matches!(load_str(text), Err(DxfError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_explicit_handles_are_kept() {
        let text = "  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1009\n  9\n$HANDSEED\n  5\n10\n  0\nENDSEC\n  0\nSECTION\n  2\nENTITIES\n  0\nLINE\n  8\n0\n  0\nLINE\n  5\n50\n  8\n0\n  0\nENDSEC\n  0\nEOF\n";
        let loaded = load_str(text).unwrap();
        let pending = loaded.entities.pending();
        assert_eq!(pending[1], Handle::new(0x50));
        assert!(pending[0] > Handle::new(0x50));
        assert!(loaded.db.get(pending[0]).unwrap().handle().is_none());
    }

    #[test]
    fn test_unknown_sections_are_kept() {
        let text = "  0\nSECTION\n  2\nACDSDATA\n 70\n2\n  0\nENDSEC\n  0\nEOF\n";
        let loaded = load_str(text).unwrap();
        assert_eq!(loaded.unknown.len(), 1);
        assert_eq!(loaded.unknown[0].tags, vec![Tag::int(70, 2)]);
    }

    #[test]
    fn test_blocks_collect_members() {
        let text = "  0\nSECTION\n  2\nBLOCKS\n  0\nBLOCK\n  2\nDOOR\n 70\n0\n  0\nLINE\n  8\n0\n  0\nENDBLK\n  0\nENDSEC\n  0\nEOF\n";
        let loaded = load_str(text).unwrap();
        let door = loaded.blocks.by_name("door").unwrap();
        assert_eq!(door.entities.len(), 1);
        assert_eq!(loaded.blocks.owner_of(door.entities[0]), Some(door.key()));
    }
}
