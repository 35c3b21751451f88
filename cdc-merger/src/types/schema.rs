use cdc_config::shared::SchemaConfig;

/// Positional record layout resolved from [`SchemaConfig`].
///
/// Snapshot rows are `commit_time, entity_id, attributes...`; change records
/// prepend the operation tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSchema {
    operation_column: String,
    commit_time_column: String,
    entity_id_column: String,
    attribute_columns: Vec<String>,
}

impl SnapshotSchema {
    pub fn attribute_columns(&self) -> &[String] {
        &self.attribute_columns
    }

    pub fn entity_id_column(&self) -> &str {
        &self.entity_id_column
    }

    /// Position of the attribute `name` among the attribute columns.
    pub fn attribute_position(&self, name: &str) -> Option<usize> {
        self.attribute_columns.iter().position(|column| column == name)
    }

    /// Number of fields of a snapshot row.
    pub fn snapshot_width(&self) -> usize {
        2 + self.attribute_columns.len()
    }

    /// Number of fields of a change record.
    pub fn change_width(&self) -> usize {
        1 + self.snapshot_width()
    }

    /// Header of snapshot files.
    pub fn snapshot_header(&self) -> Vec<&str> {
        [
            self.commit_time_column.as_str(),
            self.entity_id_column.as_str(),
        ]
        .into_iter()
        .chain(self.attribute_columns.iter().map(String::as_str))
        .collect()
    }

    /// Header of change files.
    pub fn change_header(&self) -> Vec<&str> {
        let mut header = vec![self.operation_column.as_str()];
        header.extend(self.snapshot_header());
        header
    }
}

impl From<&SchemaConfig> for SnapshotSchema {
    fn from(config: &SchemaConfig) -> Self {
        Self {
            operation_column: config.operation_column.clone(),
            commit_time_column: config.commit_time_column.clone(),
            entity_id_column: config.entity_id_column.clone(),
            attribute_columns: config.attribute_columns.clone(),
        }
    }
}

impl Default for SnapshotSchema {
    fn default() -> Self {
        Self::from(&SchemaConfig::default())
    }
}
