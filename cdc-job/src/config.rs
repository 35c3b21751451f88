use cdc_config::load_config;
use cdc_config::shared::JobConfig;

use crate::error::{JobError, JobResult};

/// Run parameters given on the command line. Set values override the
/// configuration files.
#[derive(Debug, Default, Clone)]
pub struct RunArgs {
    pub root: Option<String>,
    pub file_name: Option<String>,
}

/// Loads the job configuration, applies `args` and validates the result for a
/// run.
pub fn load_job_config(args: &RunArgs) -> JobResult<JobConfig> {
    let config = load_config::<JobConfig>().map_err(JobError::config)?;
    let config = apply_run_args(config, args);
    config.validate_for_run().map_err(JobError::config)?;

    Ok(config)
}

fn apply_run_args(mut config: JobConfig, args: &RunArgs) -> JobConfig {
    if let Some(root) = &args.root {
        config.storage.root = Some(root.clone());
    }
    if let Some(file_name) = &args.file_name {
        config.input.file_name = Some(file_name.clone());
    }

    config
}
