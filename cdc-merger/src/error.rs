//! Error type of the CDC merger.
//!
//! Every failure of a run is fatal, so [`CdcError`] carries enough context to
//! explain the failure in one report: an [`ErrorKind`] for classification, a
//! static description, optional dynamic detail (offending line, entity id,
//! path), an optional source error, the creation site and a backtrace.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type of merger operations.
pub type CdcResult<T> = Result<T, CdcError>;

/// Classification of [`CdcError`]s.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Input errors
    SchemaViolation,
    InvalidOperation,
    MissingInput,
    MissingSnapshot,

    // Merge errors
    DuplicateEntity,
    InvalidState,

    // Configuration errors
    ConfigError,

    // IO & serialization errors
    StorageIoError,
    SerializationError,

    Unknown,

    // Raised by fail points in tests.
    #[cfg(feature = "failpoints")]
    FailpointTriggered,
}

/// Error raised by any stage of a merge run.
#[derive(Debug, Clone)]
pub struct CdcError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

impl CdcError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the static description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the dynamic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured backtrace.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns the location where the error was created.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches the originating error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        CdcError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }
}

impl PartialEq for CdcError {
    fn eq(&self, other: &CdcError) -> bool {
        self.kind == other.kind && self.description == other.description
    }
}

impl fmt::Display for CdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = &self.detail {
            write!(f, "\n  Detail:")?;
            for line in detail.lines() {
                write!(f, "\n    {line}")?;
            }
        }

        Ok(())
    }
}

impl error::Error for CdcError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

impl From<(ErrorKind, &'static str)> for CdcError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, &'static str)) -> CdcError {
        CdcError::from_components(kind, Cow::Borrowed(description), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for CdcError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, description, detail): (ErrorKind, &'static str, D)) -> CdcError {
        CdcError::from_components(kind, Cow::Borrowed(description), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] with [`ErrorKind::StorageIoError`].
impl From<std::io::Error> for CdcError {
    #[track_caller]
    fn from(err: std::io::Error) -> CdcError {
        let detail = err.to_string();
        CdcError::from_components(
            ErrorKind::StorageIoError,
            Cow::Borrowed("Storage I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`csv::Error`] according to where the delimited text broke.
///
/// Malformed input maps to [`ErrorKind::SchemaViolation`]; failures of the
/// underlying reader or writer keep their I/O or serialization kind.
impl From<csv::Error> for CdcError {
    #[track_caller]
    fn from(err: csv::Error) -> CdcError {
        let (kind, description) = match err.kind() {
            csv::ErrorKind::Io(_) => (ErrorKind::StorageIoError, "Delimited text I/O failed"),
            csv::ErrorKind::Serialize(_) => {
                (ErrorKind::SerializationError, "Delimited text encoding failed")
            }
            _ => (ErrorKind::SchemaViolation, "Malformed delimited text"),
        };

        let detail = err.to_string();
        CdcError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
