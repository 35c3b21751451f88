use crate::types::{CdcOperation, CommitTime, EntityId};

/// One row of the snapshot: a record without its operation tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    commit_time: CommitTime,
    entity_id: EntityId,
    /// Attribute values in schema order.
    attributes: Vec<String>,
}

impl SnapshotRow {
    pub fn new(commit_time: CommitTime, entity_id: EntityId, attributes: Vec<String>) -> Self {
        Self {
            commit_time,
            entity_id,
            attributes,
        }
    }

    pub fn commit_time(&self) -> CommitTime {
        self.commit_time
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Replaces every non-key field with the values of `source`.
    pub fn overwrite_from(&mut self, source: &SnapshotRow) {
        self.commit_time = source.commit_time;
        self.attributes.clone_from(&source.attributes);
    }
}

/// A change record: an operation applied to the row it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub operation: CdcOperation,
    pub row: SnapshotRow,
}

impl ChangeRecord {
    pub fn new(operation: CdcOperation, row: SnapshotRow) -> Self {
        Self { operation, row }
    }

    pub fn entity_id(&self) -> &EntityId {
        self.row.entity_id()
    }
}

/// The change records of one run, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn extend(&mut self, other: ChangeBatch) {
        self.records.extend(other.records);
    }
}

impl IntoIterator for ChangeBatch {
    type Item = ChangeRecord;
    type IntoIter = std::vec::IntoIter<ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl FromIterator<ChangeRecord> for ChangeBatch {
    fn from_iter<T: IntoIterator<Item = ChangeRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
