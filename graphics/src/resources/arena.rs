//! Resource arenas with swap-remove and back-index fixup.

use std::sync::Arc;

/// Contract for arena-owned objects.
///
/// The back-index is the only handle used for removal - never an
/// arena-wide search. After a swap-remove, the moved entry's index is
/// rewritten so the invariant `arena.get(e.arena_index()) == e` holds
/// for every live entry.
pub trait ArenaEntry {
    /// Current index in the owning arena.
    fn arena_index(&self) -> usize;

    /// Update the index after insertion or swap-remove fixup.
    fn set_arena_index(&self, index: usize);
}

/// An ordered arena of shared resources.
#[derive(Debug)]
pub struct Arena<T: ArenaEntry> {
    entries: Vec<Arc<T>>,
}

impl<T: ArenaEntry> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ArenaEntry> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.entries.get(index)
    }

    /// Iterate entries in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter()
    }

    /// Append an entry and assign its back-index.
    pub fn push(&mut self, entry: Arc<T>) {
        entry.set_arena_index(self.entries.len());
        self.entries.push(entry);
    }

    /// Remove an entry via its back-index.
    ///
    /// Swap-removes and fixes up the moved entry's index. Returns the
    /// removed entry, or `None` if the entry is not in this arena.
    pub fn remove(&mut self, entry: &Arc<T>) -> Option<Arc<T>> {
        let index = entry.arena_index();
        let found = self.entries.get(index)?;
        if !Arc::ptr_eq(found, entry) {
            return None;
        }
        let removed = self.entries.swap_remove(index);
        if let Some(moved) = self.entries.get(index) {
            moved.set_arena_index(index);
        }
        Some(removed)
    }

    /// Whether `entry` is stored in this arena.
    pub fn contains(&self, entry: &Arc<T>) -> bool {
        self.entries
            .get(entry.arena_index())
            .is_some_and(|found| Arc::ptr_eq(found, entry))
    }
}
