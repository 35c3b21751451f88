//! Row and record builders for the default `FullName, City` schema.

use crate::types::{CdcOperation, ChangeRecord, CommitTime, EntityId, SnapshotRow};

fn commit_time(value: &str) -> CommitTime {
    value.parse().expect("invalid commit time in test")
}

pub fn snapshot_row(time: &str, id: &str, full_name: &str, city: &str) -> SnapshotRow {
    SnapshotRow::new(
        commit_time(time),
        EntityId::new(id),
        vec![full_name.to_string(), city.to_string()],
    )
}

pub fn insert(time: &str, id: &str, full_name: &str, city: &str) -> ChangeRecord {
    ChangeRecord::new(CdcOperation::Insert, snapshot_row(time, id, full_name, city))
}

pub fn update(time: &str, id: &str, full_name: &str, city: &str) -> ChangeRecord {
    ChangeRecord::new(CdcOperation::Update, snapshot_row(time, id, full_name, city))
}

/// A delete only needs the id; attributes are left blank.
pub fn delete(time: &str, id: &str) -> ChangeRecord {
    ChangeRecord::new(CdcOperation::Delete, snapshot_row(time, id, "", ""))
}
