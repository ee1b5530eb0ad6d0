use tracing::info;

use super::RepairPass;
use crate::document::Document;
use crate::error::Result;
use crate::types::DxfVersion;

/// Records every document needs, as (table, name)
pub(crate) const STANDARD_RECORDS: [(&str, &str); 4] = [
    ("LAYER", "0"),
    ("LTYPE", "CONTINUOUS"),
    ("STYLE", "STANDARD"),
    ("APPID", "ACAD"),
];

/// Brings old revisions up to the oldest one of their schema that is
/// written back: R10 to R12, R13/R14 to R2000. Legacy documents also
/// get their missing tables and standard records.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeLegacy;

impl RepairPass for UpgradeLegacy {
    fn name(&self) -> &str {
        "UpgradeLegacy"
    }

    fn apply(&self, doc: &mut Document) -> Result<bool> {
        let mut changed = false;
        let target = match doc.version() {
            DxfVersion::AC1006 => Some(DxfVersion::AC1009),
            DxfVersion::AC1012 | DxfVersion::AC1014 => Some(DxfVersion::AC1015),
            _ => None,
        };
        if let Some(target) = target {
            info!(from = %doc.version(), to = %target, "upgrading revision");
            doc.set_version(target)?;
            changed = true;
        }
        if doc.header.get_str("$ACADVER") != Some(doc.version().as_str()) {
            doc.header.set_str("$ACADVER", 1, doc.version().as_str());
            changed = true;
        }

        if doc.is_legacy() {
            for table in doc.required_tables() {
                if !doc.tables.contains(table) {
                    doc.ensure_table(table)?;
                    changed = true;
                }
            }
            for (table, name) in STANDARD_RECORDS {
                changed |= doc.ensure_table_record(table, name)?.1;
            }
        }
        Ok(changed)
    }
}
