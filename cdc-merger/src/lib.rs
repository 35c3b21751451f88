//! Merges change-data-capture batches into a flat-file snapshot.
//!
//! A run reads one input file from a [`store::DatasetStore`]. A file whose
//! name contains the load marker is an initial load and becomes the snapshot
//! as is. Any other file is a change batch: the prior snapshot is read from
//! the output location, every insert, update and delete is applied in file
//! order by the [`merger::Merger`], and the result replaces the output.
//!
//! [`job::CdcJob`] wires the stages together over a [`job::JobContext`].

pub mod codec;
pub mod error;
pub mod failpoints;
pub mod job;
pub mod loader;
mod macros;
pub mod merger;
pub mod snapshot;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
