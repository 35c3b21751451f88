use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::cdc_error;
use crate::error::{CdcError, ErrorKind};

/// Output format of commit times. The fraction is omitted when zero.
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Accepted naive input formats, tried in order.
const NAIVE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Commit timestamp of a record, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitTime(NaiveDateTime);

impl CommitTime {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self(timestamp)
    }

    pub fn as_naive(&self) -> &NaiveDateTime {
        &self.0
    }
}

impl fmt::Display for CommitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OUTPUT_FORMAT))
    }
}

impl FromStr for CommitTime {
    type Err = CdcError;

    /// Parses `YYYY-MM-DD HH:MM:SS[.fff]`, the same with a `T` separator,
    /// RFC 3339 with an offset (converted to UTC) or a bare date (midnight).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        for format in NAIVE_INPUT_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(timestamp));
            }
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(timestamp.naive_utc()));
        }

        if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Self(midnight));
        }

        Err(cdc_error!(
            ErrorKind::SchemaViolation,
            "Invalid commit timestamp",
            format!("`{s}` is not a timestamp")
        ))
    }
}
