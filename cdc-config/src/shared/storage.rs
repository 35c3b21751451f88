use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Where datasets live.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Storage root holding the input files and the output dataset.
    ///
    /// Usually supplied per run with `--root`.
    #[serde(default)]
    pub root: Option<String>,
    /// Output dataset location, relative to the root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl StorageConfig {
    /// Default output location under the storage root.
    pub const DEFAULT_OUTPUT_DIR: &'static str = "output";

    /// Ensures the output location is a non-empty relative path.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let output_dir = self.output_dir.trim_matches('/');
        if output_dir.is_empty() {
            return Err(ValidationError::invalid(
                "storage.output_dir",
                "must not be empty",
            ));
        }
        if output_dir.split('/').any(|segment| segment == "..") {
            return Err(ValidationError::invalid(
                "storage.output_dir",
                "must stay under the storage root",
            ));
        }
        if let Some(root) = &self.root
            && root.trim().is_empty()
        {
            return Err(ValidationError::invalid("storage.root", "must not be blank"));
        }

        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    StorageConfig::DEFAULT_OUTPUT_DIR.to_string()
}

/// Identifies the batch file processed by a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InputConfig {
    /// Input file name relative to the storage root.
    ///
    /// Usually supplied per run with `--file-name`.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Token whose presence in the file name selects initial-load mode.
    #[serde(default = "default_load_marker")]
    pub load_marker: String,
}

impl InputConfig {
    /// Default initial-load marker.
    pub const DEFAULT_LOAD_MARKER: &'static str = "LOAD";

    /// Ensures the load marker is usable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.load_marker.is_empty() {
            return Err(ValidationError::invalid(
                "input.load_marker",
                "must not be empty",
            ));
        }
        if let Some(file_name) = &self.file_name
            && file_name.trim().is_empty()
        {
            return Err(ValidationError::invalid(
                "input.file_name",
                "must not be blank",
            ));
        }

        Ok(())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file_name: None,
            load_marker: default_load_marker(),
        }
    }
}

fn default_load_marker() -> String {
    InputConfig::DEFAULT_LOAD_MARKER.to_string()
}
