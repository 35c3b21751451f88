use std::collections::HashMap;

use crate::types::EntityId;

/// Counters of index operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    /// Slots added.
    pub insert_count: u64,
    /// Ids removed.
    pub delete_count: u64,
    /// Lookups performed.
    pub lookup_count: u64,
    /// Lookups that found no slot.
    pub lookup_miss_count: u64,
}

/// Maps entity ids to the slots of their rows.
///
/// An id has more than one slot only when duplicate inserts are allowed.
#[derive(Debug, Default)]
pub struct EntityIndex {
    slots: HashMap<EntityId, Vec<usize>>,
    stats: IndexStats,
}

impl EntityIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
            stats: IndexStats::default(),
        }
    }

    /// Records that `slot` holds a row of `id`.
    pub fn insert(&mut self, id: EntityId, slot: usize) {
        self.stats.insert_count += 1;
        self.slots.entry(id).or_default().push(slot);
    }

    /// Returns the slots of `id`, in slot order.
    pub fn get(&mut self, id: &EntityId) -> Option<&[usize]> {
        self.stats.lookup_count += 1;
        let slots = self.slots.get(id).map(Vec::as_slice);
        if slots.is_none() {
            self.stats.lookup_miss_count += 1;
        }
        slots
    }

    /// Returns `true` if `id` has at least one slot, without touching stats.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.slots.contains_key(id)
    }

    /// Removes `id` and returns its slots.
    pub fn remove(&mut self, id: &EntityId) -> Option<Vec<usize>> {
        self.stats.delete_count += 1;
        self.slots.remove(id)
    }

    /// Replaces every entry with `entries`, keeping the stats.
    pub(crate) fn rebuild<'a>(&mut self, entries: impl Iterator<Item = (&'a EntityId, usize)>) {
        self.slots.clear();
        for (id, slot) in entries {
            self.slots.entry(id.clone()).or_default().push(slot);
        }
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}
