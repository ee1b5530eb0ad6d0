use tracing::debug;

use super::upgrade::STANDARD_RECORDS;
use super::RepairPass;
use crate::document::Document;
use crate::error::Result;
use crate::types::Handle;

/// Root dictionary entries created for every extended document
pub(crate) const STANDARD_DICTIONARIES: [&str; 4] = [
    "ACAD_GROUP",
    "ACAD_LAYOUT",
    "ACAD_MLINESTYLE",
    "ACAD_PLOTSETTINGS",
];

/// Extended documents only: symbol tables, the BLOCK_RECORD table with a
/// record per block, the root dictionary and its standard entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupManagementTables;

impl RepairPass for SetupManagementTables {
    fn name(&self) -> &str {
        "SetupManagementTables"
    }

    fn apply(&self, doc: &mut Document) -> Result<bool> {
        if doc.is_legacy() {
            return Ok(false);
        }
        let mut changed = false;
        for table in doc.required_tables() {
            if !doc.tables.contains(table) {
                doc.ensure_table(table)?;
                changed = true;
            }
        }
        for (table, name) in STANDARD_RECORDS {
            changed |= doc.ensure_table_record(table, name)?.1;
        }
        changed |= link_block_records(doc)?;
        changed |= setup_rootdict(doc)?;
        for name in STANDARD_DICTIONARIES {
            changed |= doc.ensure_root_dict(name)?.1;
        }
        Ok(changed)
    }
}

/// Give every block its BLOCK_RECORD and make the record own the
/// BLOCK and ENDBLK groups.
fn link_block_records(doc: &mut Document) -> Result<bool> {
    let mut changed = false;
    let blocks: Vec<(Handle, String)> = doc
        .blocks
        .iter()
        .map(|b| (b.key(), b.name.clone()))
        .collect();
    for (key, name) in blocks {
        let Some(block) = doc.blocks.get(key) else { continue };
        let (head, tail, current) = (block.block, block.endblk, block.record);
        let (record, created) = doc.ensure_table_record("BLOCK_RECORD", &name)?;
        changed |= created;
        if current != record {
            debug!(block = %name, record = %record, "block record linked");
            doc.blocks.set_record(key, record)?;
            changed = true;
        }
        for handle in [head, tail] {
            let group = doc.db.get_mut(handle)?;
            if group.owner() != Some(record) {
                group.set_owner(record);
                changed = true;
            }
        }
    }
    Ok(changed)
}

/// The first object must be a DICTIONARY; create one in front otherwise.
fn setup_rootdict(doc: &mut Document) -> Result<bool> {
    let root = doc.objects.rootdict();
    let is_dictionary = doc
        .db
        .get(root)
        .map_or(false, |group| group.dxftype() == "DICTIONARY");
    if is_dictionary {
        return Ok(false);
    }
    let dict = doc.factory.new_dictionary(false)?;
    let handle = doc.add_object(dict, Handle::NULL);
    doc.objects.set_rootdict(handle);
    debug!(handle = %handle, "root dictionary created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::blocks::MODEL_SPACE;

    const R2000_BARE: &str = "  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1015\n  0\nENDSEC\n  0\nSECTION\n  2\nENTITIES\n  0\nLINE\n  5\n2A\n100\nAcDbEntity\n  8\n0\n100\nAcDbLine\n 10\n0.0\n 20\n0.0\n 30\n0.0\n 11\n1.0\n 21\n1.0\n 31\n0.0\n  0\nENDSEC\n  0\nEOF\n";

    #[test]
    fn test_bare_extended_file_gets_management_structures() {
        let doc = Document::read(R2000_BARE.as_bytes()).unwrap();
        assert!(doc.tables().contains("BLOCK_RECORD"));
        assert!(doc.tables().has_record("BLOCK_RECORD", MODEL_SPACE));
        let root = doc.objects().rootdict();
        assert_eq!(doc.db().get(root).unwrap().dxftype(), "DICTIONARY");
        for name in STANDARD_DICTIONARIES {
            assert!(doc.rootdict_entry(name).is_some(), "{}", name);
        }
        let model = doc.active_layout_keys().0;
        let line = doc.entity(Handle::new(0x2A)).unwrap();
        assert_eq!(line.owner(), model);
    }

    #[test]
    fn test_block_owned_by_record() {
        let doc = Document::new(crate::types::DxfVersion::AC1018).unwrap();
        for block in doc.blocks.iter() {
            assert!(block.record.is_valid());
            assert_eq!(doc.db().get(block.block).unwrap().owner(), Some(block.record));
            assert_eq!(doc.db().get(block.endblk).unwrap().owner(), Some(block.record));
        }
    }
}
