use tracing::debug;

use crate::snapshot::{EntityIndex, IndexStats};
use crate::types::{CommitTime, EntityId, SnapshotRow};

/// Tombstones tolerated before a compaction is considered.
const COMPACTION_MIN_TOMBSTONES: usize = 1024;

/// The snapshot being merged.
///
/// Surviving rows keep their relative order and inserted rows are appended,
/// so the materialized table lists rows in the order a sequential fold over
/// the change batch would.
#[derive(Debug, Default)]
pub struct SnapshotTable {
    slots: Vec<Option<SnapshotRow>>,
    index: EntityIndex,
    live_rows: usize,
}

impl SnapshotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows in file order. Duplicate ids are kept.
    pub fn from_rows(rows: Vec<SnapshotRow>) -> Self {
        let mut table = Self {
            slots: Vec::with_capacity(rows.len()),
            index: EntityIndex::with_capacity(rows.len()),
            live_rows: 0,
        };
        for row in rows {
            table.insert(row);
        }
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.live_rows
    }

    pub fn is_empty(&self) -> bool {
        self.live_rows == 0
    }

    /// Returns `true` if at least one row has `id`.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains(id)
    }

    /// Returns the rows of `id`, in table order.
    pub fn rows_with_id<'a>(&'a self, id: &'a EntityId) -> impl Iterator<Item = &'a SnapshotRow> {
        self.iter().filter(move |row| row.entity_id() == id)
    }

    /// Returns every row in table order.
    pub fn iter(&self) -> impl Iterator<Item = &SnapshotRow> {
        self.slots.iter().flatten()
    }

    /// Appends `row`.
    pub fn insert(&mut self, row: SnapshotRow) {
        let slot = self.slots.len();
        self.index.insert(row.entity_id().clone(), slot);
        self.slots.push(Some(row));
        self.live_rows += 1;
    }

    /// Overwrites the commit time and attributes of every row of `source`'s
    /// id with those of `source`. Returns the number of rows changed.
    pub fn update(&mut self, source: &SnapshotRow) -> usize {
        let Some(slots) = self.index.get(source.entity_id()) else {
            return 0;
        };

        let mut updated = 0;
        for &slot in slots {
            if let Some(row) = self.slots[slot].as_mut() {
                row.overwrite_from(source);
                updated += 1;
            }
        }
        updated
    }

    /// Removes every row of `id`. Returns the number of rows removed.
    pub fn delete(&mut self, id: &EntityId) -> usize {
        if !self.index.contains(id) {
            return 0;
        }
        let Some(slots) = self.index.remove(id) else {
            return 0;
        };

        let mut deleted = 0;
        for slot in slots {
            if self.slots[slot].take().is_some() {
                deleted += 1;
            }
        }
        self.live_rows -= deleted;
        self.maybe_compact();

        deleted
    }

    /// Replaces the rows of `row`'s id with `row`, in place of the first
    /// existing one. Appends when the id is absent. Returns the number of rows
    /// replaced.
    pub fn replace(&mut self, row: SnapshotRow) -> usize {
        let Some(slots) = self.index.remove(row.entity_id()) else {
            self.insert(row);
            return 0;
        };

        let replaced = slots.len();
        let Some((&first, rest)) = slots.split_first() else {
            self.insert(row);
            return 0;
        };
        for &slot in rest {
            if self.slots[slot].take().is_some() {
                self.live_rows -= 1;
            }
        }

        self.index.insert(row.entity_id().clone(), first);
        self.slots[first] = Some(row);
        self.maybe_compact();

        replaced
    }

    /// Returns the index counters.
    pub fn index_stats(&self) -> &IndexStats {
        self.index.stats()
    }

    /// Consumes the table and returns its rows in table order.
    pub fn into_rows(self) -> Vec<SnapshotRow> {
        self.slots.into_iter().flatten().collect()
    }

    /// Drops tombstones once they outnumber live rows.
    fn maybe_compact(&mut self) {
        let tombstones = self.slots.len() - self.live_rows;
        if tombstones < COMPACTION_MIN_TOMBSTONES || tombstones <= self.live_rows {
            return;
        }

        debug!(tombstones, live_rows = self.live_rows, "compacting snapshot table");

        self.slots.retain(Option::is_some);
        let entries = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, row)| row.as_ref().map(|row| (row.entity_id(), slot)));
        self.index.rebuild(entries);
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl FromIterator<SnapshotRow> for SnapshotTable {
    fn from_iter<T: IntoIterator<Item = SnapshotRow>>(iter: T) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}

/// Commit time of the newest row, if any.
pub(crate) fn latest_commit_time(table: &SnapshotTable) -> Option<CommitTime> {
    table.iter().map(SnapshotRow::commit_time).max()
}
