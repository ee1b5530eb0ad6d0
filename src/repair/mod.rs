//! Normalization passes applied once after parsing
//!
//! Every pass is idempotent: applying it to a document it already ran on
//! changes nothing and reports `false`.

mod disto;
mod handles;
mod layouts;
mod management;
mod upgrade;

pub use disto::RepairDistoSignature;
pub use handles::EnableHandles;
pub use layouts::LinkLayouts;
pub use management::SetupManagementTables;
pub use upgrade::UpgradeLegacy;

use tracing::debug;

use crate::document::Document;
use crate::error::Result;

/// One repair pass over a loaded document.
pub trait RepairPass {
    /// Name of this pass, used in logs
    fn name(&self) -> &str;

    /// Apply the pass; returns true if the document changed.
    fn apply(&self, doc: &mut Document) -> Result<bool>;
}

/// An ordered sequence of repair passes.
pub struct RepairPipeline {
    passes: Vec<Box<dyn RepairPass>>,
}

impl RepairPipeline {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// The passes every loaded document goes through, in order.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.add(Box::new(UpgradeLegacy));
        pipeline.add(Box::new(SetupManagementTables));
        pipeline.add(Box::new(RepairDistoSignature));
        pipeline.add(Box::new(EnableHandles));
        pipeline.add(Box::new(LinkLayouts));
        pipeline
    }

    pub fn add(&mut self, pass: Box<dyn RepairPass>) {
        self.passes.push(pass);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run all passes in order; returns the names of the passes that
    /// changed the document. The first failing pass aborts the run.
    pub fn run(&self, doc: &mut Document) -> Result<Vec<String>> {
        let mut changed = Vec::new();
        for pass in &self.passes {
            let modified = pass.apply(doc)?;
            debug!(pass = pass.name(), modified, "repair pass");
            if modified {
                changed.push(pass.name().to_string());
            }
        }
        Ok(changed)
    }
}

impl Default for RepairPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RepairPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.passes.iter().map(|p| p.name()))
            .finish()
    }
}
