//! Reads the base snapshot and the change batch of a run.

use std::fmt;

use tracing::{debug, info};

use crate::bail;
use crate::error::{CdcResult, ErrorKind};
use crate::job::JobContext;
use crate::snapshot::SnapshotTable;
use crate::store::{DatasetPart, DatasetStore};
use crate::types::{ChangeBatch, SnapshotRow};

/// How the input file of a run is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// The input is a full dump that becomes the snapshot as is.
    InitialLoad,
    /// The input is a change batch merged into the prior snapshot.
    Incremental,
}

impl LoadMode {
    /// Selects [`LoadMode::InitialLoad`] when `file_name` contains `marker`.
    ///
    /// The match is case sensitive and may occur anywhere in the name.
    pub fn detect(file_name: &str, marker: &str) -> Self {
        if file_name.contains(marker) {
            Self::InitialLoad
        } else {
            Self::Incremental
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialLoad => "initial_load",
            Self::Incremental => "incremental",
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything read before merging.
#[derive(Debug)]
pub enum LoadedInput {
    /// Rows of an initial load file, in file order.
    InitialLoad(Vec<SnapshotRow>),
    /// The prior snapshot and the changes to apply to it.
    Incremental {
        snapshot: SnapshotTable,
        batch: ChangeBatch,
    },
}

impl LoadedInput {
    pub fn mode(&self) -> LoadMode {
        match self {
            Self::InitialLoad(_) => LoadMode::InitialLoad,
            Self::Incremental { .. } => LoadMode::Incremental,
        }
    }
}

/// Loads the inputs of a run from the context's store.
#[derive(Debug)]
pub struct SnapshotLoader<'a, S> {
    context: &'a JobContext<S>,
}

impl<'a, S> SnapshotLoader<'a, S>
where
    S: DatasetStore,
{
    pub fn new(context: &'a JobContext<S>) -> Self {
        Self { context }
    }

    /// Detects the mode from the input file name and reads the inputs.
    ///
    /// Fails with [`ErrorKind::MissingInput`] when the input file does not
    /// exist and with [`ErrorKind::MissingSnapshot`] when an incremental run
    /// finds no prior output.
    pub async fn load(&self) -> CdcResult<LoadedInput> {
        let input_file = self.context.input_file();
        let mode = LoadMode::detect(input_file, &self.context.config().input.load_marker);

        info!(%input_file, %mode, "loading run inputs");

        match mode {
            LoadMode::InitialLoad => {
                let rows = self.read_initial_load().await?;
                Ok(LoadedInput::InitialLoad(rows))
            }
            LoadMode::Incremental => {
                let snapshot = self.read_snapshot().await?;
                let batch = self.read_change_batch().await?;
                Ok(LoadedInput::Incremental { snapshot, batch })
            }
        }
    }

    /// Reads the input file with the snapshot layout.
    pub async fn read_initial_load(&self) -> CdcResult<Vec<SnapshotRow>> {
        let parts = self.read_input().await?;

        let mut rows = Vec::new();
        for part in &parts {
            rows.extend(self.context.codec().decode_snapshot(&part.name, &part.contents)?);
        }

        debug!(rows = rows.len(), "read initial load");

        Ok(rows)
    }

    /// Reads the prior output into a snapshot table.
    ///
    /// An output location without any data part counts as missing: a
    /// published snapshot always has one part, even when it holds no rows.
    pub async fn read_snapshot(&self) -> CdcResult<SnapshotTable> {
        let output_dir = self.context.output_dir();
        let parts = match self.context.store().read_dataset(output_dir).await? {
            Some(parts) if !parts.is_empty() => parts,
            found => bail!(
                ErrorKind::MissingSnapshot,
                "No prior snapshot for an incremental run",
                format!(
                    "{} at `{output_dir}`; run an initial load file first",
                    if found.is_some() { "no data part" } else { "nothing found" }
                )
            ),
        };

        let mut rows = Vec::new();
        for part in &parts {
            rows.extend(self.context.codec().decode_snapshot(&part.name, &part.contents)?);
        }

        info!(parts = parts.len(), rows = rows.len(), "read prior snapshot");

        Ok(SnapshotTable::from_rows(rows))
    }

    /// Reads the input file with the change layout.
    pub async fn read_change_batch(&self) -> CdcResult<ChangeBatch> {
        let parts = self.read_input().await?;

        let mut batch = ChangeBatch::empty();
        for part in &parts {
            batch.extend(self.context.codec().decode_changes(&part.name, &part.contents)?);
        }

        debug!(records = batch.len(), "read change batch");

        Ok(batch)
    }

    async fn read_input(&self) -> CdcResult<Vec<DatasetPart>> {
        let input_file = self.context.input_file();
        match self.context.store().read_dataset(input_file).await? {
            Some(parts) => Ok(parts),
            None => bail!(
                ErrorKind::MissingInput,
                "Input file does not exist",
                format!("`{input_file}` was not found in the {} store", S::name())
            ),
        }
    }
}
