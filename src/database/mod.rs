//! Entity database: every tag group of a document, keyed by handle

mod compress;
mod group;
mod handles;

pub use group::TagGroup;
pub use handles::HandleSeed;

use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{DxfError, Result};
use crate::types::Handle;

/// Handle-keyed store of all tag groups.
///
/// Insertion order is discovery order. Follower chains (VERTEX/ATTRIB up to
/// SEQEND) are stored as groups of their own and linked to their main
/// entity.
#[derive(Debug, Clone, Default)]
pub struct EntityDb {
    groups: IndexMap<Handle, TagGroup>,
    followers: AHashMap<Handle, Vec<Handle>>,
    seed: HandleSeed,
    binary_compressed: bool,
}

impl EntityDb {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database issuing handles from `seed`.
    pub fn with_seed(seed: Handle) -> Self {
        Self {
            seed: HandleSeed::new(seed),
            ..Self::default()
        }
    }

    /// Register a group read from a stream.
    ///
    /// The group keeps its own handle when it has a free one. A group
    /// without handle gets a fresh key but no handle tag; a group whose
    /// handle is already taken is given a fresh handle, written back.
    pub fn add(&mut self, mut group: TagGroup) -> Handle {
        match group.handle() {
            Some(handle) if !self.groups.contains_key(&handle) => {
                self.seed.ensure_above(handle);
                self.groups.insert(handle, group);
                handle
            }
            Some(handle) => {
                let fresh = self.next_handle();
                warn!(
                    handle = %handle,
                    replacement = %fresh,
                    dxftype = group.dxftype(),
                    "duplicate handle reassigned"
                );
                group.set_handle(fresh);
                self.groups.insert(fresh, group);
                fresh
            }
            None => {
                let fresh = self.next_handle();
                self.groups.insert(fresh, group);
                fresh
            }
        }
    }

    /// Register a newly built group under a fresh handle, written into
    /// the group.
    pub fn add_new(&mut self, mut group: TagGroup) -> Handle {
        let handle = self.next_handle();
        group.set_handle(handle);
        self.groups.insert(handle, group);
        handle
    }

    /// Store `group` under an explicit key, replacing any previous group.
    pub fn insert(&mut self, handle: Handle, group: TagGroup) -> Option<TagGroup> {
        self.seed.ensure_above(handle);
        self.groups.insert(handle, group)
    }

    /// Next unused handle.
    pub fn next_handle(&mut self) -> Handle {
        loop {
            let handle = self.seed.next();
            if !self.groups.contains_key(&handle) {
                return handle;
            }
        }
    }

    /// Current handle seed (next handle to be issued).
    pub fn seed(&self) -> Handle {
        self.seed.peek()
    }

    /// Raise the seed above `handle`.
    pub fn reserve(&mut self, handle: Handle) {
        self.seed.ensure_above(handle);
    }

    pub fn get(&self, handle: Handle) -> Result<&TagGroup> {
        self.groups
            .get(&handle)
            .ok_or(DxfError::HandleNotFound(handle))
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut TagGroup> {
        self.groups
            .get_mut(&handle)
            .ok_or(DxfError::HandleNotFound(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.groups.contains_key(&handle)
    }

    /// Remove a group and its followers; returns the main group.
    pub fn remove(&mut self, handle: Handle) -> Result<TagGroup> {
        let group = self
            .groups
            .shift_remove(&handle)
            .ok_or(DxfError::HandleNotFound(handle))?;
        if let Some(followers) = self.followers.remove(&handle) {
            for follower in followers {
                self.groups.shift_remove(&follower);
            }
        }
        Ok(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Handles in discovery order
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.groups.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &TagGroup)> {
        self.groups.iter().map(|(h, g)| (*h, g))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut TagGroup)> {
        self.groups.iter_mut().map(|(h, g)| (*h, g))
    }

    /// Follower groups of a main entity (VERTEX..., SEQEND).
    pub fn followers(&self, main: Handle) -> &[Handle] {
        self.followers
            .get(&main)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_followers(&mut self, main: Handle, followers: Vec<Handle>) {
        if followers.is_empty() {
            self.followers.remove(&main);
        } else {
            self.followers.insert(main, followers);
        }
    }

    /// Main entity a follower belongs to.
    pub fn main_of(&self, follower: Handle) -> Option<Handle> {
        self.followers
            .iter()
            .find(|(_, list)| list.contains(&follower))
            .map(|(main, _)| *main)
    }

    /// Largest handle in use.
    pub fn max_handle(&self) -> Handle {
        self.groups.keys().copied().max().unwrap_or(Handle::NULL)
    }

    /// True once [`EntityDb::compress_binary_data`] has run.
    pub fn is_binary_compressed(&self) -> bool {
        self.binary_compressed
    }

    /// Compress runs of binary chunks in every group. Runs at most once;
    /// returns the number of groups changed.
    pub fn compress_binary_data(&mut self) -> Result<usize> {
        if self.binary_compressed {
            return Ok(0);
        }
        let mut changed = 0;
        for group in self.groups.values_mut() {
            if compress::compress_group(group)? {
                changed += 1;
            }
        }
        self.binary_compressed = true;
        debug!(groups = changed, "binary data compressed");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dxf::Tag;

    fn group(dxftype: &str, handle: Option<u64>) -> TagGroup {
        let mut group = TagGroup::new(dxftype);
        if let Some(h) = handle {
            group.set_handle(Handle::new(h));
        }
        group
    }

    #[test]
    fn test_add_keeps_own_handle() {
        let mut db = EntityDb::new();
        let h = db.add(group("LINE", Some(0x20)));
        assert_eq!(h, Handle::new(0x20));
        assert!(db.seed() > Handle::new(0x20));
    }

    #[test]
    fn test_add_reassigns_duplicates() {
        let mut db = EntityDb::new();
        db.add(group("LINE", Some(0x20)));
        let second = db.add(group("CIRCLE", Some(0x20)));
        assert_ne!(second, Handle::new(0x20));
        assert_eq!(db.get(second).unwrap().handle(), Some(second));
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_add_without_handle_allocates_key_only() {
        let mut db = EntityDb::with_seed(Handle::new(0x100));
        let h = db.add(group("LINE", None));
        assert_eq!(h, Handle::new(0x100));
        assert_eq!(db.get(h).unwrap().handle(), None);
        let h2 = db.add_new(group("LINE", None));
        assert_eq!(db.get(h2).unwrap().handle(), Some(h2));
    }

    #[test]
    fn test_next_handle_skips_used_values() {
        let mut db = EntityDb::with_seed(Handle::new(1));
        // explicit handle above the seed
        db.groups.insert(Handle::new(2), group("LINE", Some(2)));
        assert_eq!(db.next_handle(), Handle::new(1));
        assert_eq!(db.next_handle(), Handle::new(3));
    }

    #[test]
    fn test_remove_drops_followers() {
        let mut db = EntityDb::new();
        let main = db.add_new(group("POLYLINE", None));
        let v = db.add_new(group("VERTEX", None));
        let s = db.add_new(group("SEQEND", None));
        db.set_followers(main, vec![v, s]);
        assert_eq!(db.main_of(s), Some(main));
        db.remove(main).unwrap();
        assert!(db.is_empty());
        assert!(matches!(db.get(main), Err(DxfError::HandleNotFound(_))));
    }

    #[test]
    fn test_compress_runs_once() {
        let mut db = EntityDb::new();
        db.add_new(TagGroup::with_tags(
            "OLE2FRAME",
            [Tag::binary(310, vec![1; 10]), Tag::binary(310, vec![2; 10])],
        ));
        assert_eq!(db.compress_binary_data().unwrap(), 1);
        assert!(db.is_binary_compressed());
        assert_eq!(db.compress_binary_data().unwrap(), 0);
    }
}
