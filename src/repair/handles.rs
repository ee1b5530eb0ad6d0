use tracing::debug;

use super::RepairPass;
use crate::document::Document;
use crate::error::Result;

/// Writes the database key of every group without handle tag as its
/// handle (code 5, 105 for DIMSTYLE). Keys of such groups were issued
/// from the seed in file order, so synthesized handles ascend in file
/// order too. Legacy documents get `$HANDLING = 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnableHandles;

impl RepairPass for EnableHandles {
    fn name(&self) -> &str {
        "EnableHandles"
    }

    fn apply(&self, doc: &mut Document) -> Result<bool> {
        let mut count = 0usize;
        for (key, group) in doc.db.iter_mut() {
            if group.handle().is_none() {
                group.set_handle(key);
                count += 1;
            }
        }
        if count > 0 {
            debug!(count, "handles synthesized");
        }
        let mut changed = count > 0;
        if doc.is_legacy() && doc.header.get_int("$HANDLING") != Some(1) {
            doc.header.set_int("$HANDLING", 70, 1);
            changed = true;
        }
        Ok(changed)
    }
}
