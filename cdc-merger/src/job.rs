//! Run orchestration: load, merge, write.

use std::sync::Arc;

use cdc_config::shared::JobConfig;
use tracing::info;

use crate::bail;
use crate::codec::DelimitedCodec;
use crate::error::{CdcResult, ErrorKind};
use crate::failpoints::{RUN_JOB__AFTER_MERGE, cdc_fail_point};
use crate::loader::{LoadMode, LoadedInput, SnapshotLoader};
use crate::merger::{MergeBatchResult, Merger};
use crate::snapshot::{SnapshotTable, latest_commit_time};
use crate::store::DatasetStore;
use crate::store::base::normalize_path;
use crate::types::{CdcOperation, ChangeRecord, CommitTime, SnapshotSchema};

/// State shared by every stage of a run.
///
/// Created once per process from a validated configuration and torn down with
/// [`JobContext::shutdown`].
#[derive(Debug)]
pub struct JobContext<S> {
    config: Arc<JobConfig>,
    codec: DelimitedCodec,
    input_file: String,
    output_dir: String,
    store: S,
}

impl<S> JobContext<S>
where
    S: DatasetStore,
{
    /// Validates `config` and binds it to the input file and store of a run.
    pub fn new(config: JobConfig, input_file: impl Into<String>, store: S) -> CdcResult<Self> {
        if let Err(err) = config.validate() {
            bail!(
                ErrorKind::ConfigError,
                "Invalid job configuration",
                err.to_string(),
                source: err
            );
        }

        let input_file = normalize_path(&input_file.into());
        if input_file.is_empty() {
            bail!(ErrorKind::ConfigError, "The input file name is empty");
        }

        let schema = Arc::new(SnapshotSchema::from(&config.schema));
        let codec = DelimitedCodec::new(schema, config.format.clone());
        let output_dir = normalize_path(&config.storage.output_dir);

        Ok(Self {
            config: Arc::new(config),
            codec,
            input_file,
            output_dir,
            store,
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn schema(&self) -> &SnapshotSchema {
        self.codec.schema()
    }

    pub fn codec(&self) -> &DelimitedCodec {
        &self.codec
    }

    /// Input file of the run, relative to the store root.
    pub fn input_file(&self) -> &str {
        &self.input_file
    }

    /// Output dataset location, relative to the store root.
    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the store.
    pub async fn shutdown(self) -> CdcResult<()> {
        info!(store = S::name(), "shutting down job context");
        self.store.shutdown().await
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub mode: LoadMode,
    /// Rows of the prior snapshot, zero for initial loads.
    pub snapshot_rows_read: usize,
    /// Rows or records read from the input file.
    pub input_records_read: usize,
    /// Merge counts, absent for initial loads.
    pub merge: Option<MergeBatchResult>,
    pub rows_written: usize,
    /// Newest commit time in the written snapshot.
    pub latest_commit_time: Option<CommitTime>,
}

/// A single merge run over a [`JobContext`].
#[derive(Debug)]
pub struct CdcJob<S> {
    context: JobContext<S>,
}

impl<S> CdcJob<S>
where
    S: DatasetStore,
{
    pub fn new(context: JobContext<S>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &JobContext<S> {
        &self.context
    }

    /// Loads the inputs, merges them and replaces the output snapshot.
    ///
    /// Nothing is written unless every record was read and applied.
    pub async fn run(&self) -> CdcResult<JobSummary> {
        info!(
            input_file = %self.context.input_file(),
            output_dir = %self.context.output_dir(),
            store = S::name(),
            "starting cdc job"
        );

        let input = SnapshotLoader::new(&self.context).load().await?;
        let mode = input.mode();
        let duplicate_insert = self.context.config().merge.duplicate_insert;

        let (table, snapshot_rows_read, input_records_read, merge) = match input {
            LoadedInput::InitialLoad(rows) => {
                let count = rows.len();

                // Load rows are inserts into an empty snapshot, so repeated
                // ids follow the duplicate-insert policy.
                let inserts = rows
                    .into_iter()
                    .map(|row| ChangeRecord::new(CdcOperation::Insert, row))
                    .collect();
                let mut merger = Merger::new(SnapshotTable::new(), duplicate_insert);
                merger.merge_batch(inserts)?;

                (merger.into_snapshot(), 0, count, None)
            }
            LoadedInput::Incremental { snapshot, batch } => {
                let snapshot_rows = snapshot.len();
                let records = batch.len();

                let mut merger = Merger::new(snapshot, duplicate_insert);
                let result = merger.merge_batch(batch)?;
                cdc_fail_point(RUN_JOB__AFTER_MERGE)?;

                (merger.into_snapshot(), snapshot_rows, records, Some(result))
            }
        };

        let rows_written = table.len();
        let latest_commit_time = latest_commit_time(&table);
        let encoded = self.context.codec().encode_snapshot(table.iter())?;

        self.context
            .store()
            .write_dataset(self.context.output_dir(), encoded)
            .await?;

        let summary = JobSummary {
            mode,
            snapshot_rows_read,
            input_records_read,
            merge,
            rows_written,
            latest_commit_time,
        };

        info!(
            %mode,
            snapshot_rows_read,
            input_records_read,
            rows_written,
            latest_commit_time = ?summary.latest_commit_time.map(|time| time.to_string()),
            "cdc job completed"
        );

        Ok(summary)
    }

    /// Shuts down the context.
    pub async fn shutdown(self) -> CdcResult<()> {
        self.context.shutdown().await
    }
}
