//! Record types of the CDC merger.

mod commit_time;
mod entity;
mod operation;
mod row;
mod schema;

pub use commit_time::CommitTime;
pub use entity::EntityId;
pub use operation::CdcOperation;
pub use row::{ChangeBatch, ChangeRecord, SnapshotRow};
pub use schema::SnapshotSchema;
