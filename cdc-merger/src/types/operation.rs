use std::fmt;
use std::str::FromStr;

use crate::cdc_error;
use crate::error::{CdcError, ErrorKind};

/// Operation tag of a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CdcOperation {
    /// Tagged `I`.
    Insert,
    /// Tagged `U`.
    Update,
    /// Tagged `D`.
    Delete,
}

impl CdcOperation {
    /// Returns the tag written in change files.
    pub fn tag(&self) -> &'static str {
        match self {
            CdcOperation::Insert => "I",
            CdcOperation::Update => "U",
            CdcOperation::Delete => "D",
        }
    }
}

impl fmt::Display for CdcOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CdcOperation {
    type Err = CdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Self::Insert),
            "U" => Ok(Self::Update),
            "D" => Ok(Self::Delete),
            other => Err(cdc_error!(
                ErrorKind::InvalidOperation,
                "Unrecognized operation tag",
                format!("expected one of `I`, `U`, `D`, found `{other}`")
            )),
        }
    }
}
