use indexmap::IndexMap;
use tracing::info;

use super::RepairPass;
use crate::document::Document;
use crate::error::Result;
use crate::notification::NotificationType;
use crate::sections::tables::table_key;
use crate::types::Handle;

/// Legacy files written by Leica Disto laser meters reference layers
/// and linetypes they never define. Such files state `$ACADVER` but
/// neither `$HANDSEED` nor `$DWGCODEPAGE`; the missing records are
/// created with default attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairDistoSignature;

impl RepairDistoSignature {
    fn has_signature(doc: &Document) -> bool {
        doc.is_legacy()
            && doc.header.contains("$ACADVER")
            && !doc.header.contains("$HANDSEED")
            && !doc.header.contains("$DWGCODEPAGE")
    }
}

impl RepairPass for RepairDistoSignature {
    fn name(&self) -> &str {
        "RepairDistoSignature"
    }

    fn apply(&self, doc: &mut Document) -> Result<bool> {
        if !Self::has_signature(doc) {
            return Ok(false);
        }
        let (layers, linetypes) = undefined_names(doc);
        if layers.is_empty() && linetypes.is_empty() {
            return Ok(false);
        }
        for name in layers.values() {
            doc.new_table_record("LAYER", name)?;
        }
        for name in linetypes.values() {
            doc.new_table_record("LTYPE", name)?;
        }
        let message = format!(
            "created {} undefined layer(s) and {} linetype(s) of a Leica Disto file",
            layers.len(),
            linetypes.len()
        );
        info!(layers = layers.len(), linetypes = linetypes.len(), "Disto file repaired");
        doc.notifications.notify(NotificationType::Repaired, message);
        Ok(true)
    }
}

/// Layer and linetype names used by entities but missing from the tables,
/// keyed by table key; the first spelling seen is kept.
fn undefined_names(doc: &Document) -> (IndexMap<String, String>, IndexMap<String, String>) {
    let members = doc
        .blocks
        .iter()
        .flat_map(|b| b.entities.iter().copied())
        .collect::<Vec<Handle>>();
    let mut layers = IndexMap::new();
    let mut linetypes = IndexMap::new();
    for handle in doc.entities.pending().iter().copied().chain(members) {
        let Ok(group) = doc.db.get(handle) else { continue };
        if let Some(layer) = group.get_str(8) {
            if !doc.tables.has_record("LAYER", layer) {
                layers
                    .entry(table_key(layer))
                    .or_insert_with(|| layer.to_string());
            }
        }
        if let Some(linetype) = group.get_str(6) {
            let by = linetype.eq_ignore_ascii_case("BYLAYER") || linetype.eq_ignore_ascii_case("BYBLOCK");
            if !by && !doc.tables.has_record("LTYPE", linetype) {
                linetypes
                    .entry(table_key(linetype))
                    .or_insert_with(|| linetype.to_string());
            }
        }
    }
    (layers, linetypes)
}
