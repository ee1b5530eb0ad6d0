//! OBJECTS section: non-graphical objects, root dictionary first

use crate::database::EntityDb;
use crate::error::Result;
use crate::io::dxf::{TagWriter, TagWriterExt};
use crate::types::Handle;

/// Object handles in file order. The first object is the root dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectsSection {
    handles: Vec<Handle>,
}

impl ObjectsSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root dictionary, null for an empty section
    pub fn rootdict(&self) -> Handle {
        self.handles.first().copied().unwrap_or(Handle::NULL)
    }

    /// Make `handle` the root dictionary.
    pub fn set_rootdict(&mut self, handle: Handle) {
        self.handles.retain(|h| *h != handle);
        self.handles.insert(0, handle);
    }

    pub fn push(&mut self, handle: Handle) {
        if !self.handles.contains(&handle) {
            self.handles.push(handle);
        }
    }

    pub fn remove(&mut self, handle: Handle) -> bool {
        let before = self.handles.len();
        self.handles.retain(|h| *h != handle);
        before != self.handles.len()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.handles.contains(&handle)
    }

    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Objects of one type label, in section order
    pub fn query<'a>(&'a self, db: &'a EntityDb, dxftype: &'a str) -> impl Iterator<Item = Handle> + 'a {
        self.handles
            .iter()
            .copied()
            .filter(move |h| db.get(*h).map_or(false, |g| g.dxftype() == dxftype))
    }

    pub fn write<W: TagWriter + ?Sized>(&self, db: &EntityDb, w: &mut W) -> Result<()> {
        w.write_section_start("OBJECTS")?;
        for handle in &self.handles {
            w.write_tags(db.get(*handle)?.tags())?;
        }
        w.write_section_end()
    }
}
