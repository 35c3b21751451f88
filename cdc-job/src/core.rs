use cdc_config::shared::{JobConfig, ValidationError};
use cdc_merger::job::{CdcJob, JobContext, JobSummary};
use cdc_merger::store::fs::FsDatasetStore;
use tracing::info;

use crate::error::{JobError, JobResult};

/// Runs one merge over the filesystem store rooted at `storage.root`.
///
/// The store is shut down whether or not the run succeeded.
pub async fn run_job_with_config(config: JobConfig) -> JobResult<JobSummary> {
    let root = config
        .storage
        .root
        .clone()
        .ok_or_else(|| JobError::config(ValidationError::MissingParameter("storage.root".into())))?;
    let file_name = config.input.file_name.clone().ok_or_else(|| {
        JobError::config(ValidationError::MissingParameter("input.file_name".into()))
    })?;

    log_config(&config);

    let context = JobContext::new(config, file_name, FsDatasetStore::new(root))?;
    let job = CdcJob::new(context);

    let result = job.run().await;
    job.shutdown().await?;
    let summary = result?;

    info!(
        mode = %summary.mode,
        rows_written = summary.rows_written,
        "cdc job finished"
    );

    Ok(summary)
}

fn log_config(config: &JobConfig) {
    info!(
        root = config.storage.root.as_deref().unwrap_or_default(),
        output_dir = %config.storage.output_dir,
        file_name = config.input.file_name.as_deref().unwrap_or_default(),
        load_marker = %config.input.load_marker,
        delimiter = %config.format.delimiter,
        has_header = config.format.has_header,
        duplicate_insert = %config.merge.duplicate_insert,
        "job configuration"
    );
}
