//! CDC merge job binary.
//!
//! Loads configuration, applies `--root` and `--file-name`, initializes
//! tracing and runs one merge over the filesystem store. Any failure prints a
//! report to stderr and exits with status 1.

use std::process::ExitCode;

use cdc_config::Environment;
use cdc_config::shared::JobConfig;
use cdc_telemetry::tracing::init_tracing;
use clap::Parser;
use tracing::error;

use crate::config::{RunArgs, load_job_config};
use crate::core::run_job_with_config;
use crate::error::{JobError, JobResult};

mod config;
mod core;
mod error;

/// Command line of the job.
#[derive(Debug, Parser)]
#[command(version, about = "Merges a CDC batch file into the output snapshot")]
struct Args {
    /// Storage root holding the input file and the output dataset.
    #[arg(long)]
    root: Option<String>,
    /// Input file, relative to the root. Names containing the load marker are
    /// initial loads.
    #[arg(long)]
    file_name: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let run_args = RunArgs {
        root: args.root,
        file_name: args.file_name,
    };

    match run(run_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run(args: RunArgs) -> JobResult<()> {
    let environment = Environment::load().map_err(JobError::config)?;
    let job_config = load_job_config(&args)?;

    let _log_flusher =
        init_tracing(env!("CARGO_BIN_NAME"), environment).map_err(JobError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(job_config))
}

async fn async_main(job_config: JobConfig) -> JobResult<()> {
    if let Err(err) = run_job_with_config(job_config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
