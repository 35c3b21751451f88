//! Applies change batches to the snapshot.

use cdc_config::shared::DuplicateInsertPolicy;
use tracing::{debug, info};

use crate::bail;
use crate::error::{CdcResult, ErrorKind};
use crate::snapshot::{IndexStats, SnapshotTable};
use crate::types::{CdcOperation, ChangeBatch, ChangeRecord};

/// What a single change record did to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A row was appended.
    Inserted,
    /// Existing rows with the id were replaced by the inserted row.
    Overwritten { rows: usize },
    /// Rows with the id received the new values.
    Updated { rows: usize },
    /// The update targeted an id with no row.
    UpdateMissed,
    /// Rows with the id were removed. `rows` is zero when none existed.
    Deleted { rows: usize },
}

/// Result of merging a single batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeBatchResult {
    /// Total records processed in this batch.
    pub records_processed: usize,
    /// Number of insert operations.
    pub inserts: usize,
    /// Number of update operations.
    pub updates: usize,
    /// Number of delete operations.
    pub deletes: usize,
    /// Updates whose id had no row.
    pub update_misses: usize,
    /// Inserts that replaced existing rows.
    pub overwrites: usize,
    /// Rows removed by deletes.
    pub rows_deleted: usize,
}

impl MergeBatchResult {
    /// Creates an empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    fn record(&mut self, operation: CdcOperation, outcome: ApplyOutcome) {
        self.records_processed += 1;
        match operation {
            CdcOperation::Insert => self.inserts += 1,
            CdcOperation::Update => self.updates += 1,
            CdcOperation::Delete => self.deletes += 1,
        }
        match outcome {
            ApplyOutcome::Overwritten { .. } => self.overwrites += 1,
            ApplyOutcome::UpdateMissed => self.update_misses += 1,
            ApplyOutcome::Deleted { rows } => self.rows_deleted += rows,
            ApplyOutcome::Inserted | ApplyOutcome::Updated { .. } => {}
        }
    }
}

/// Folds change records into a snapshot, one record at a time.
///
/// Every record observes the effects of the records before it, so the result
/// depends on batch order: `[Insert(1), Delete(1)]` leaves no row while
/// `[Delete(1), Insert(1)]` leaves one.
#[derive(Debug)]
pub struct Merger {
    snapshot: SnapshotTable,
    duplicate_insert: DuplicateInsertPolicy,
}

impl Merger {
    pub fn new(snapshot: SnapshotTable, duplicate_insert: DuplicateInsertPolicy) -> Self {
        Self {
            snapshot,
            duplicate_insert,
        }
    }

    /// Applies one record.
    ///
    /// Fails with [`ErrorKind::DuplicateEntity`] when an insert targets an
    /// existing id under [`DuplicateInsertPolicy::Reject`]. The snapshot is
    /// left untouched in that case.
    pub fn apply(&mut self, record: ChangeRecord) -> CdcResult<ApplyOutcome> {
        let ChangeRecord { operation, row } = record;

        let outcome = match operation {
            CdcOperation::Insert => {
                if !self.snapshot.contains(row.entity_id()) {
                    self.snapshot.insert(row);
                    return Ok(ApplyOutcome::Inserted);
                }

                match self.duplicate_insert {
                    DuplicateInsertPolicy::Reject => {
                        bail!(
                            ErrorKind::DuplicateEntity,
                            "Insert of an entity already in the snapshot",
                            format!("entity id `{}`", row.entity_id())
                        );
                    }
                    DuplicateInsertPolicy::Allow => {
                        debug!(entity_id = %row.entity_id(), "appending duplicate entity");
                        self.snapshot.insert(row);
                        ApplyOutcome::Inserted
                    }
                    DuplicateInsertPolicy::Overwrite => {
                        let rows = self.snapshot.replace(row);
                        ApplyOutcome::Overwritten { rows }
                    }
                }
            }
            CdcOperation::Update => match self.snapshot.update(&row) {
                0 => {
                    debug!(entity_id = %row.entity_id(), "update of unknown entity ignored");
                    ApplyOutcome::UpdateMissed
                }
                rows => ApplyOutcome::Updated { rows },
            },
            CdcOperation::Delete => ApplyOutcome::Deleted {
                rows: self.snapshot.delete(row.entity_id()),
            },
        };

        Ok(outcome)
    }

    /// Applies every record of `batch` in order.
    ///
    /// Stops at the first failing record; earlier records stay applied to the
    /// in-memory snapshot but nothing is persisted.
    pub fn merge_batch(&mut self, batch: ChangeBatch) -> CdcResult<MergeBatchResult> {
        if batch.is_empty() {
            return Ok(MergeBatchResult::empty());
        }

        debug!(records = batch.len(), "processing change batch");

        let mut result = MergeBatchResult::empty();
        for record in batch {
            let operation = record.operation;
            let outcome = self.apply(record)?;
            result.record(operation, outcome);
        }

        info!(
            records = result.records_processed,
            inserts = result.inserts,
            updates = result.updates,
            deletes = result.deletes,
            update_misses = result.update_misses,
            rows = self.snapshot.len(),
            "batch merged"
        );

        Ok(result)
    }

    /// Returns the snapshot in its current state.
    pub fn snapshot(&self) -> &SnapshotTable {
        &self.snapshot
    }

    /// Returns index statistics.
    pub fn index_stats(&self) -> &IndexStats {
        self.snapshot.index_stats()
    }

    pub fn into_snapshot(self) -> SnapshotTable {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::rows::{delete, insert, snapshot_row, update};
    use crate::types::{EntityId, SnapshotRow};

    fn base() -> SnapshotTable {
        SnapshotTable::from_rows(vec![
            snapshot_row("2024-01-01 00:00:00", "1", "Alice", "NY"),
            snapshot_row("2024-01-01 00:00:00", "2", "Bob", "LA"),
        ])
    }

    fn merge(snapshot: SnapshotTable, records: Vec<ChangeRecord>) -> Vec<SnapshotRow> {
        let mut merger = Merger::new(snapshot, DuplicateInsertPolicy::Reject);
        merger.merge_batch(ChangeBatch::new(records)).unwrap();
        merger.into_snapshot().into_rows()
    }

    #[test]
    fn insert_adds_exactly_one_row() {
        let rows = merge(base(), vec![insert("2024-01-02 00:00:00", "3", "Cy", "SF")]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|row| row.entity_id().as_str() == "3").count(), 1);
        assert_eq!(rows[2], snapshot_row("2024-01-02 00:00:00", "3", "Cy", "SF"));
    }

    #[test]
    fn delete_removes_the_id() {
        let rows = merge(base(), vec![delete("2024-01-02 00:00:00", "1")]);

        assert_eq!(rows, vec![snapshot_row("2024-01-01 00:00:00", "2", "Bob", "LA")]);
    }

    #[test]
    fn update_replaces_values_and_leaves_other_rows() {
        let rows = merge(base(), vec![update("2024-01-03 00:00:00", "2", "Robert", "Austin")]);

        assert_eq!(
            rows,
            vec![
                snapshot_row("2024-01-01 00:00:00", "1", "Alice", "NY"),
                snapshot_row("2024-01-03 00:00:00", "2", "Robert", "Austin"),
            ]
        );
    }

    #[test]
    fn update_of_missing_id_is_a_counted_no_op() {
        let mut merger = Merger::new(base(), DuplicateInsertPolicy::Reject);

        let result = merger
            .merge_batch(ChangeBatch::new(vec![update("2024-01-03 00:00:00", "7", "X", "Y")]))
            .unwrap();

        assert_eq!(result.updates, 1);
        assert_eq!(result.update_misses, 1);
        assert_eq!(merger.into_snapshot().into_rows(), base().into_rows());
    }

    #[test]
    fn empty_batch_returns_snapshot_unchanged() {
        let mut merger = Merger::new(base(), DuplicateInsertPolicy::Reject);

        let result = merger.merge_batch(ChangeBatch::empty()).unwrap();

        assert_eq!(result, MergeBatchResult::empty());
        assert_eq!(merger.into_snapshot().into_rows(), base().into_rows());
    }

    #[test]
    fn insert_then_delete_leaves_nothing() {
        let rows = merge(
            SnapshotTable::new(),
            vec![
                insert("2024-01-01 00:00:00", "1", "Alice", "NY"),
                delete("2024-01-01 00:00:01", "1"),
            ],
        );

        assert!(rows.is_empty());
    }

    #[test]
    fn delete_then_insert_leaves_one_row() {
        let rows = merge(
            base(),
            vec![
                delete("2024-01-02 00:00:00", "1"),
                insert("2024-01-02 00:00:01", "1", "Alice", "Boston"),
            ],
        );

        assert_eq!(
            rows,
            vec![
                snapshot_row("2024-01-01 00:00:00", "2", "Bob", "LA"),
                snapshot_row("2024-01-02 00:00:01", "1", "Alice", "Boston"),
            ]
        );
    }

    #[test]
    fn later_records_see_earlier_inserts() {
        let rows = merge(
            SnapshotTable::new(),
            vec![
                insert("2024-01-01 00:00:00", "1", "Alice", "NY"),
                update("2024-01-01 00:00:05", "1", "Alicia", "NY"),
            ],
        );

        assert_eq!(rows, vec![snapshot_row("2024-01-01 00:00:05", "1", "Alicia", "NY")]);
    }

    #[test]
    fn duplicate_insert_is_rejected_by_default() {
        let mut merger = Merger::new(base(), DuplicateInsertPolicy::default());

        let err = merger
            .apply(insert("2024-01-02 00:00:00", "1", "Alice", "NY"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateEntity);
        assert_eq!(merger.snapshot().len(), 2);
    }

    #[test]
    fn duplicate_insert_allowed_appends_and_delete_removes_both() {
        let mut merger = Merger::new(base(), DuplicateInsertPolicy::Allow);

        let outcome = merger
            .apply(insert("2024-01-02 00:00:00", "1", "Alice", "NY"))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Inserted);
        assert_eq!(merger.snapshot().rows_with_id(&EntityId::new("1")).count(), 2);

        let outcome = merger.apply(delete("2024-01-03 00:00:00", "1")).unwrap();
        assert_eq!(outcome, ApplyOutcome::Deleted { rows: 2 });
        assert!(!merger.snapshot().contains(&EntityId::new("1")));
    }

    #[test]
    fn duplicate_insert_overwrite_upserts() {
        let mut merger = Merger::new(base(), DuplicateInsertPolicy::Overwrite);

        let result = merger
            .merge_batch(ChangeBatch::new(vec![insert(
                "2024-01-02 00:00:00",
                "1",
                "Alicia",
                "SF",
            )]))
            .unwrap();

        assert_eq!(result.overwrites, 1);
        assert_eq!(
            merger.into_snapshot().into_rows(),
            vec![
                snapshot_row("2024-01-02 00:00:00", "1", "Alicia", "SF"),
                snapshot_row("2024-01-01 00:00:00", "2", "Bob", "LA"),
            ]
        );
    }

    #[test]
    fn batch_result_counts_operations() {
        let mut merger = Merger::new(base(), DuplicateInsertPolicy::Reject);

        let result = merger
            .merge_batch(ChangeBatch::new(vec![
                insert("2024-01-02 00:00:00", "3", "Cy", "SF"),
                update("2024-01-02 00:00:01", "1", "Alicia", "NY"),
                delete("2024-01-02 00:00:02", "2"),
                delete("2024-01-02 00:00:03", "2"),
            ]))
            .unwrap();

        assert_eq!(
            result,
            MergeBatchResult {
                records_processed: 4,
                inserts: 1,
                updates: 1,
                deletes: 2,
                update_misses: 0,
                overwrites: 0,
                rows_deleted: 1,
            }
        );
        assert!(merger.index_stats().lookup_count >= 1);
    }
}
