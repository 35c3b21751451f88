use fail::fail_point;

#[cfg(feature = "failpoints")]
use crate::bail;
use crate::error::CdcResult;
#[cfg(feature = "failpoints")]
use crate::error::ErrorKind;

/// Between writing the new output part and publishing it under its final name.
pub const WRITE_DATASET__BEFORE_COMMIT: &str = "write_dataset.before_commit";

/// After the merge finished and before the result is encoded.
pub const RUN_JOB__AFTER_MERGE: &str = "run_job.after_merge";

/// Returns an error when the fail point `name` is configured to `return`.
///
/// Compiles to `Ok(())` unless the `failpoints` feature is enabled.
pub fn cdc_fail_point(name: &str) -> CdcResult<()> {
    fail_point!(name, |parameter| {
        bail!(
            ErrorKind::FailpointTriggered,
            "An error occurred in a fail point",
            format!(
                "The failpoint '{name}' returned an error{}",
                parameter.map(|p| format!(" ({p})")).unwrap_or_default()
            )
        );
    });

    Ok(())
}
