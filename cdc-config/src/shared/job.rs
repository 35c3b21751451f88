use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{
    FormatConfig, InputConfig, MergeConfig, SchemaConfig, StorageConfig, ValidationError,
};

/// Complete configuration of a merge run.
///
/// Loaded from `configuration/` at startup; `--root` and `--file-name` flags
/// fill in the per-run parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobConfig {
    /// Dataset locations.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Batch file selection.
    #[serde(default)]
    pub input: InputConfig,
    /// Delimited text format.
    #[serde(default)]
    pub format: FormatConfig,
    /// Record layout.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Merge behavior.
    #[serde(default)]
    pub merge: MergeConfig,
}

impl JobConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.storage.validate()?;
        self.input.validate()?;
        self.format.validate()?;
        self.schema.validate()?;

        Ok(())
    }

    /// Validates the configuration and requires the run parameters to be set.
    pub fn validate_for_run(&self) -> Result<(), ValidationError> {
        self.validate()?;

        if self.storage.root.is_none() {
            return Err(ValidationError::MissingParameter("storage.root".to_string()));
        }
        if self.input.file_name.is_none() {
            return Err(ValidationError::MissingParameter(
                "input.file_name".to_string(),
            ));
        }

        Ok(())
    }
}

impl Config for JobConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["schema.attribute_columns"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::DuplicateInsertPolicy;

    #[test]
    fn empty_document_uses_defaults() {
        let config: JobConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.storage.output_dir, "output");
        assert_eq!(config.input.load_marker, "LOAD");
        assert_eq!(config.format.delimiter, ',');
        assert!(!config.format.has_header);
        assert_eq!(config.merge.duplicate_insert, DuplicateInsertPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_insert_policy_deserializes_from_snake_case() {
        let config: JobConfig =
            serde_json::from_str(r#"{"merge": {"duplicate_insert": "overwrite"}}"#).unwrap();
        assert_eq!(
            config.merge.duplicate_insert,
            DuplicateInsertPolicy::Overwrite
        );
    }

    #[test]
    fn run_requires_root_and_file_name() {
        let mut config = JobConfig::default();
        assert_eq!(
            config.validate_for_run(),
            Err(ValidationError::MissingParameter("storage.root".to_string()))
        );

        config.storage.root = Some("/data/bucket".to_string());
        assert_eq!(
            config.validate_for_run(),
            Err(ValidationError::MissingParameter(
                "input.file_name".to_string()
            ))
        );

        config.input.file_name = Some("LOAD00000001.csv".to_string());
        assert!(config.validate_for_run().is_ok());
    }

    #[test]
    fn quote_delimiter_is_rejected() {
        let config = JobConfig {
            format: FormatConfig {
                delimiter: '"',
                has_header: false,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_dir_must_stay_under_root() {
        let mut config = JobConfig::default();
        config.storage.output_dir = "../elsewhere".to_string();
        assert!(config.validate().is_err());
    }
}
