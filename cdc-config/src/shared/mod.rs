//! Configuration types shared by the merger library and the job binary.

mod base;
mod format;
mod job;
mod merge;
mod schema;
mod storage;

pub use base::ValidationError;
pub use format::FormatConfig;
pub use job::JobConfig;
pub use merge::{DuplicateInsertPolicy, MergeConfig};
pub use schema::SchemaConfig;
pub use storage::{InputConfig, StorageConfig};
