use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Column names of the positional record layout.
///
/// Snapshot files hold `commit_time, entity_id, attributes...`; change files
/// prepend the operation column.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SchemaConfig {
    /// Operation tag column of change files.
    #[serde(default = "default_operation_column")]
    pub operation_column: String,
    /// Commit timestamp column.
    #[serde(default = "default_commit_time_column")]
    pub commit_time_column: String,
    /// Entity identifier column.
    #[serde(default = "default_entity_id_column")]
    pub entity_id_column: String,
    /// Attribute columns, in file order.
    #[serde(default = "default_attribute_columns")]
    pub attribute_columns: Vec<String>,
}

impl SchemaConfig {
    pub const DEFAULT_OPERATION_COLUMN: &'static str = "Op";
    pub const DEFAULT_COMMIT_TIME_COLUMN: &'static str = "tx_commit_time";
    pub const DEFAULT_ENTITY_ID_COLUMN: &'static str = "PersonID";
    pub const DEFAULT_ATTRIBUTE_COLUMNS: &'static [&'static str] = &["FullName", "City"];

    /// Returns every column name of the change layout, in file order.
    pub fn change_columns(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.operation_column.as_str()).chain(self.snapshot_columns())
    }

    /// Returns every column name of the snapshot layout, in file order.
    pub fn snapshot_columns(&self) -> impl Iterator<Item = &str> {
        [
            self.commit_time_column.as_str(),
            self.entity_id_column.as_str(),
        ]
        .into_iter()
        .chain(self.attribute_columns.iter().map(String::as_str))
    }

    /// Ensures every column has a distinct, non-blank name and at least one
    /// attribute column exists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.attribute_columns.is_empty() {
            return Err(ValidationError::invalid(
                "schema.attribute_columns",
                "must name at least one column",
            ));
        }

        let mut seen = HashSet::new();
        for column in self.change_columns() {
            if column.trim().is_empty() {
                return Err(ValidationError::invalid(
                    "schema",
                    "column names must not be blank",
                ));
            }
            if !seen.insert(column) {
                return Err(ValidationError::DuplicateColumn(column.to_string()));
            }
        }

        Ok(())
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            operation_column: default_operation_column(),
            commit_time_column: default_commit_time_column(),
            entity_id_column: default_entity_id_column(),
            attribute_columns: default_attribute_columns(),
        }
    }
}

fn default_operation_column() -> String {
    SchemaConfig::DEFAULT_OPERATION_COLUMN.to_string()
}

fn default_commit_time_column() -> String {
    SchemaConfig::DEFAULT_COMMIT_TIME_COLUMN.to_string()
}

fn default_entity_id_column() -> String {
    SchemaConfig::DEFAULT_ENTITY_ID_COLUMN.to_string()
}

fn default_attribute_columns() -> Vec<String> {
    SchemaConfig::DEFAULT_ATTRIBUTE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect()
}
