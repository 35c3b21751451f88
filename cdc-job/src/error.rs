use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use cdc_merger::error::{CdcError, ErrorKind};

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type of the job binary.
pub type JobResult<T> = Result<T, JobError>;

/// Backtrace taken when a configuration or runtime error is wrapped.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    /// Captures the current backtrace.
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    /// Renders the wrapped backtrace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error ending a job run.
///
/// Merge failures keep their [`CdcError`] so the report can show the kind and
/// the offending file, line or entity. Everything that fails before the run
/// starts is a configuration or runtime error.
#[derive(Debug)]
pub enum JobError {
    /// The merge run failed.
    Cdc(CdcError),
    /// Configuration files, overrides or run parameters are unusable.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The tokio runtime could not be started.
    Runtime(std::io::Error, CapturedBacktrace),
}

impl JobError {
    /// Wraps a configuration loading or validation failure.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        JobError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns the merge error kind, if the run itself failed.
    pub fn cdc_kind(&self) -> Option<ErrorKind> {
        match self {
            JobError::Cdc(err) => Some(err.kind()),
            JobError::Config(_, _) | JobError::Runtime(_, _) => None,
        }
    }

    /// Returns a short label naming the stage that failed.
    pub fn category(&self) -> &'static str {
        match self.cdc_kind() {
            Some(ErrorKind::SchemaViolation | ErrorKind::InvalidOperation) => "malformed input",
            Some(ErrorKind::MissingInput | ErrorKind::MissingSnapshot) => "missing dataset",
            Some(ErrorKind::DuplicateEntity) => "merge conflict",
            Some(ErrorKind::StorageIoError) => "storage error",
            Some(ErrorKind::ConfigError) => "configuration error",
            Some(_) => "job error",
            None => match self {
                JobError::Runtime(_, _) => "runtime error",
                _ => "configuration error",
            },
        }
    }

    /// Returns what the operator can do about the failure, when it is known.
    pub fn hint(&self) -> Option<&'static str> {
        match self.cdc_kind()? {
            ErrorKind::MissingSnapshot => {
                Some("run an initial load file (name containing the load marker) first")
            }
            ErrorKind::DuplicateEntity => {
                Some("set APP_MERGE__DUPLICATE_INSERT to `allow` or `overwrite` to accept it")
            }
            ErrorKind::SchemaViolation | ErrorKind::InvalidOperation => {
                Some("the output was not modified; fix the input file and rerun")
            }
            _ => None,
        }
    }

    /// Returns the backtrace taken where the error was created.
    pub fn backtrace(&self) -> &Backtrace {
        match self {
            JobError::Cdc(err) => err.backtrace(),
            JobError::Config(_, backtrace) | JobError::Runtime(_, backtrace) => &backtrace.0,
        }
    }

    /// Renders the error for the terminal: category, message, causes, a hint
    /// and, with `RUST_BACKTRACE`, the backtrace.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("cdc job failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if let Some(hint) = self.hint() {
            out.push_str(&format!("hint: {hint}\n"));
        }

        if should_render_backtrace() {
            out.push_str("backtrace:\n");
            out.push_str(&self.backtrace().to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for JobError {
    /// Renders a one-line description for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Cdc(err) => write!(f, "{err}"),
            JobError::Config(source, _) => write!(f, "configuration error: {source}"),
            JobError::Runtime(source, _) => write!(f, "failed to start the runtime: {source}"),
        }
    }
}

impl Error for JobError {
    /// Returns the direct cause.
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            JobError::Cdc(err) => err.source(),
            JobError::Config(source, _) => Some(source.as_ref()),
            JobError::Runtime(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for JobError {
    /// Converts a runtime build failure.
    fn from(err: std::io::Error) -> Self {
        JobError::Runtime(err, CapturedBacktrace::capture())
    }
}

impl From<CdcError> for JobError {
    /// Converts a merge run failure.
    fn from(err: CdcError) -> Self {
        JobError::Cdc(err)
    }
}
