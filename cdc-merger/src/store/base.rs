use std::future::Future;

use crate::error::CdcResult;

/// File name of the single part written for an output dataset.
pub const OUTPUT_PART_NAME: &str = "part-00000.csv";

/// One file of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPart {
    /// Name of the part, used in error messages.
    pub name: String,
    /// Raw delimited text.
    pub contents: Vec<u8>,
}

impl DatasetPart {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// Storage holding input files and output datasets under one root.
///
/// Paths are `/`-separated and relative to the root. A dataset is either a
/// single file or a directory of part files.
///
/// The job reads everything it needs before it writes, and runs against the
/// same root must be serialized by the caller.
pub trait DatasetStore {
    /// Returns the name of the store.
    fn name() -> &'static str;

    /// Reads every data part of the dataset at `path`, in part-name order.
    ///
    /// Returns [`None`] when nothing exists at `path`.
    fn read_dataset(
        &self,
        path: &str,
    ) -> impl Future<Output = CdcResult<Option<Vec<DatasetPart>>>> + Send;

    /// Replaces the dataset at `path` with `contents` as its only part.
    ///
    /// Implementations must leave the previous dataset readable if the write
    /// fails before the new part is published.
    fn write_dataset(
        &self,
        path: &str,
        contents: Vec<u8>,
    ) -> impl Future<Output = CdcResult<()>> + Send;

    /// Releases resources at the end of a run. The default is a no-op.
    fn shutdown(&self) -> impl Future<Output = CdcResult<()>> + Send {
        async { Ok(()) }
    }
}

/// Normalizes a relative dataset path: trims slashes and drops empty segments.
pub(crate) fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
