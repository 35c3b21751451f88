use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Delimited text format of every dataset read or written by a run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FormatConfig {
    /// Field delimiter, a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Whether files carry a header row. Headers are skipped on read and
    /// written on output.
    #[serde(default)]
    pub has_header: bool,
}

impl FormatConfig {
    /// Default field delimiter.
    pub const DEFAULT_DELIMITER: char = ',';

    /// Returns the delimiter as a byte.
    ///
    /// Only meaningful once [`FormatConfig::validate`] has accepted the delimiter.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// Ensures the delimiter is a single ASCII character that is not a quote or line break.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.delimiter.is_ascii() {
            return Err(ValidationError::invalid(
                "format.delimiter",
                "must be an ASCII character",
            ));
        }
        if matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(ValidationError::invalid(
                "format.delimiter",
                "must not be a quote or a line break",
            ));
        }

        Ok(())
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            has_header: false,
        }
    }
}

fn default_delimiter() -> char {
    FormatConfig::DEFAULT_DELIMITER
}
