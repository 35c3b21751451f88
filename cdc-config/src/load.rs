use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory, relative to the working directory, holding configuration files.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for each configuration file.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between the prefix and the first key segment.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator between nested key segments (`APP_MERGE__DUPLICATE_INSERT`).
const ENV_SEPARATOR: &str = "__";

/// Separator of list elements in environment variables.
const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration structures.
pub trait Config {
    /// Keys whose environment overrides are parsed as comma separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Which configuration file is being resolved.
#[derive(Debug, Clone, Copy)]
enum ConfigFile {
    Base,
    Overlay(Environment),
}

impl ConfigFile {
    fn stem(&self) -> Cow<'static, str> {
        match self {
            ConfigFile::Base => Cow::Borrowed("base"),
            ConfigFile::Overlay(environment) => Cow::Borrowed(environment.as_str()),
        }
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFile::Base => f.write_str("base configuration"),
            ConfigFile::Overlay(environment) => write!(f, "{environment} configuration overlay"),
        }
    }
}

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    /// The working directory could not be determined.
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// The configuration directory does not exist.
    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    /// The base configuration file is missing.
    #[error("could not locate {description} in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        description: String,
        directory: PathBuf,
        attempted: String,
    },

    /// A configuration file exists but does not parse.
    #[error("failed to load {description} from `{path}`: {source}")]
    ConfigurationFileLoad {
        description: String,
        path: PathBuf,
        source: config::ConfigError,
    },

    /// The `APP_ENVIRONMENT` value is not supported.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    /// Sources were merged but the result did not build.
    #[error("failed to build configuration: {0}")]
    Builder(#[source] config::ConfigError),

    /// The merged configuration does not match the target type.
    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),
}

/// Loads `T` from `./configuration` using the environment named by `APP_ENVIRONMENT`.
///
/// See [`load_config_from_dir`] for the layering rules.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let environment = Environment::load()?;

    load_config_from_dir(&base_path.join(CONFIGURATION_DIR), environment)
}

/// Loads `T` from `directory`.
///
/// Sources are layered, later ones winning:
/// 1. `base.(yaml|yml|json)`, required;
/// 2. `{environment}.(yaml|yml|json)`, optional;
/// 3. `APP_`-prefixed environment variables, nested keys joined by `__`.
///
/// Environment values stay strings, so `APP_INPUT__FILE_NAME=00000001` keeps
/// its leading zeros. Only [`Config::LIST_PARSE_KEYS`] are split on `,`.
pub fn load_config_from_dir<T>(
    directory: &Path,
    environment: Environment,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    load_with_variables(directory, environment, std::env::vars().collect())
}

/// Loads `T` from `directory` with `variables` standing in for the process
/// environment.
fn load_with_variables<T>(
    directory: &Path,
    environment: Environment,
    variables: config::Map<String, String>,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let base_file = find_configuration_file(directory, ConfigFile::Base).map_err(|attempted| {
        LoadConfigError::ConfigurationFileMissing {
            description: ConfigFile::Base.to_string(),
            directory: directory.to_path_buf(),
            attempted,
        }
    })?;

    let builder = config::Config::builder().add_source(config::File::from(base_file.as_path()));
    check_source(&builder, ConfigFile::Base, &base_file)?;

    let overlay = ConfigFile::Overlay(environment);
    let builder = match find_configuration_file(directory, overlay) {
        Ok(overlay_file) => {
            let builder = builder.add_source(config::File::from(overlay_file.as_path()));
            check_source(&builder, overlay, &overlay_file)?;
            builder
        }
        Err(_) => builder,
    };

    let mut builder = builder.add_source(environment_source(variables.clone()));
    for (key, values) in list_overrides::<T>(&variables) {
        builder = builder
            .set_override(key, values)
            .map_err(LoadConfigError::Builder)?;
    }

    let settings = builder.build().map_err(LoadConfigError::Builder)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

fn environment_source(variables: config::Map<String, String>) -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .source(Some(variables))
}

/// Splits the environment values of list keys into their elements.
fn list_overrides<T: Config>(
    variables: &config::Map<String, String>,
) -> Vec<(&'static str, Vec<String>)> {
    T::LIST_PARSE_KEYS
        .iter()
        .filter_map(|key| {
            let name = format!(
                "{ENV_PREFIX}{ENV_PREFIX_SEPARATOR}{}",
                key.replace('.', ENV_SEPARATOR).to_uppercase()
            );
            let value = variables.get(&name)?;
            let values = value
                .split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|element| !element.is_empty())
                .map(str::to_string)
                .collect();
            Some((*key, values))
        })
        .collect()
}

/// Returns the first existing file for `file`, or the list of attempted paths.
fn find_configuration_file(directory: &Path, file: ConfigFile) -> Result<PathBuf, String> {
    let stem = file.stem();
    let candidates: Vec<PathBuf> = CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .collect();

    if let Some(found) = candidates.iter().find(|path| path.is_file()) {
        return Ok(found.clone());
    }

    Err(candidates
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", "))
}

/// Builds the sources accumulated so far to attribute parse errors to `path`.
fn check_source(
    builder: &ConfigBuilder<DefaultState>,
    file: ConfigFile,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .build_cloned()
        .map(|_| ())
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            description: file.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        size: u32,
    }

    impl Config for Sample {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cdc-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn overlay_overrides_base_values() {
        let dir = scratch_dir();
        fs::write(dir.join("base.yaml"), "name: base\nsize: 1\n").unwrap();
        fs::write(dir.join("prod.yaml"), "size: 7\n").unwrap();

        let sample: Sample = load_config_from_dir(&dir, Environment::Prod).unwrap();
        assert_eq!(sample.name, "base");
        assert_eq!(sample.size, 7);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn overlay_is_optional() {
        let dir = scratch_dir();
        fs::write(dir.join("base.json"), r#"{"name": "json", "size": 3}"#).unwrap();

        let sample: Sample = load_config_from_dir(&dir, Environment::Dev).unwrap();
        assert_eq!(sample.name, "json");
        assert_eq!(sample.size, 3);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_base_file_lists_attempted_paths() {
        let dir = scratch_dir();

        let err = load_config_from_dir::<Sample>(&dir, Environment::Dev).unwrap_err();
        match err {
            LoadConfigError::ConfigurationFileMissing { attempted, .. } => {
                assert!(attempted.contains("base.yaml"));
                assert!(attempted.contains("base.json"));
            }
            other => panic!("unexpected error: {other}"),
        }

        fs::remove_dir_all(dir).unwrap();
    }

    #[derive(Debug, Deserialize)]
    struct Run {
        file_name: String,
        columns: Vec<String>,
    }

    impl Config for Run {
        const LIST_PARSE_KEYS: &'static [&'static str] = &["columns"];
    }

    #[test]
    fn environment_values_stay_strings_and_lists_are_split() {
        let dir = scratch_dir();
        fs::write(dir.join("base.yaml"), "file_name: base.csv\ncolumns: [a]\n").unwrap();
        let variables = config::Map::from([
            ("APP_FILE_NAME".to_string(), "00000001".to_string()),
            ("APP_COLUMNS".to_string(), "FullName, City".to_string()),
        ]);

        let run: Run = load_with_variables(&dir, Environment::Dev, variables).unwrap();
        assert_eq!(run.file_name, "00000001");
        assert_eq!(run.columns, vec!["FullName", "City"]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = std::env::temp_dir().join(format!("cdc-config-missing-{}", uuid::Uuid::new_v4()));

        let err = load_config_from_dir::<Sample>(&dir, Environment::Dev).unwrap_err();
        assert!(matches!(
            err,
            LoadConfigError::MissingConfigurationDirectory(_)
        ));
    }
}
