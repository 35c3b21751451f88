//! Configuration for the CDC snapshot merger.
//!
//! Holds the typed job configuration, its validation rules, and the loader that
//! assembles it from `configuration/` files and `APP_` environment overrides.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from_dir};
