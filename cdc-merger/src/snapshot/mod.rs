//! In-memory snapshot table.
//!
//! Rows live in insertion-ordered slots. An [`EntityIndex`] maps every entity
//! id to its slots so updates and deletes touch only the rows they target
//! instead of scanning the table.

mod index;
mod table;

pub use index::{EntityIndex, IndexStats};
pub use table::SnapshotTable;
pub(crate) use table::latest_commit_time;
