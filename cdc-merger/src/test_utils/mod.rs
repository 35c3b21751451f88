//! Helpers for unit and integration tests.
//!
//! Enabled under `cfg(test)` and by the `test-utils` feature.

pub mod dir;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod rows;
