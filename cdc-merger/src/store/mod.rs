//! Dataset storage used by the loader and the job.

pub mod base;
pub mod fs;
pub mod memory;

pub use base::{DatasetPart, DatasetStore, OUTPUT_PART_NAME};
