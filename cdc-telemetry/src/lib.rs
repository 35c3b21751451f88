//! Logging setup for the CDC merger binaries and tests.

pub mod tracing;
