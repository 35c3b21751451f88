use std::fmt;

use serde::{Deserialize, Serialize};

/// What an insert does when its entity id is already in the snapshot.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateInsertPolicy {
    /// Fail the run. Keeps entity ids unique in the snapshot.
    #[default]
    Reject,
    /// Append a second row with the same id.
    Allow,
    /// Replace the existing rows with the inserted one.
    Overwrite,
}

impl fmt::Display for DuplicateInsertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateInsertPolicy::Reject => f.write_str("reject"),
            DuplicateInsertPolicy::Allow => f.write_str("allow"),
            DuplicateInsertPolicy::Overwrite => f.write_str("overwrite"),
        }
    }
}

/// Merge behavior.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MergeConfig {
    /// Policy applied to inserts of an id already present.
    #[serde(default)]
    pub duplicate_insert: DuplicateInsertPolicy,
}
