use cdc_config::shared::JobConfig;
use cdc_merger::error::ErrorKind;
use cdc_merger::failpoints::{RUN_JOB__AFTER_MERGE, WRITE_DATASET__BEFORE_COMMIT};
use cdc_merger::job::{CdcJob, JobContext};
use cdc_merger::store::OUTPUT_PART_NAME;
use cdc_merger::store::fs::FsDatasetStore;
use cdc_merger::test_utils::dir::TestDir;
use cdc_merger::test_utils::failpoints::CustomFailScenario;
use cdc_telemetry::tracing::init_test_tracing;

const PRIOR_SNAPSHOT: &str = "2024-01-01 00:00:00,1,Alice,NY\n2024-01-01 00:00:00,2,Bob,LA\n";

fn prepare() -> TestDir {
    let dir = TestDir::new();
    dir.write("output/part-00000.csv", PRIOR_SNAPSHOT);
    dir.write(
        "batch.csv",
        "D,2024-01-02 00:00:00,1,Alice,NY\nI,2024-01-02 00:00:01,3,Cy,SF\n",
    );
    dir
}

fn job(dir: &TestDir) -> CdcJob<FsDatasetStore> {
    job_for(dir, "batch.csv")
}

fn job_for(dir: &TestDir, input_file: &str) -> CdcJob<FsDatasetStore> {
    let store = FsDatasetStore::new(dir.path());
    CdcJob::new(JobContext::new(JobConfig::default(), input_file, store).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_commit_keeps_prior_snapshot() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(WRITE_DATASET__BEFORE_COMMIT, "return")]);
    let dir = prepare();

    let err = job(&dir).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    assert_eq!(dir.read("output/part-00000.csv"), PRIOR_SNAPSHOT);
    assert_eq!(dir.file_names("output"), vec![OUTPUT_PART_NAME.to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_after_merge_writes_nothing() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(RUN_JOB__AFTER_MERGE, "return(simulated)")]);
    let dir = prepare();

    let err = job(&dir).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    assert!(err.to_string().contains("simulated"));
    assert_eq!(dir.read("output/part-00000.csv"), PRIOR_SNAPSHOT);
}

#[tokio::test(flavor = "multi_thread")]
async fn rerun_after_failure_succeeds() {
    init_test_tracing();
    let dir = prepare();

    {
        let _scenario = CustomFailScenario::setup(&[(WRITE_DATASET__BEFORE_COMMIT, "return")]);
        job(&dir).run().await.unwrap_err();
    }

    // Holding an empty scenario keeps fail points of other tests from firing.
    let _scenario = CustomFailScenario::setup(&[]);
    job(&dir).run().await.unwrap();

    assert_eq!(
        dir.read("output/part-00000.csv"),
        "2024-01-01 00:00:00,2,Bob,LA\n2024-01-02 00:00:01,3,Cy,SF\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_initial_load_does_not_bootstrap_incremental_runs() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write(
        "LOAD001.csv",
        "2024-01-01 00:00:00,1,Alice,NY\n2024-01-01 00:00:00,2,Bob,LA\n",
    );
    dir.write("batch.csv", "I,2024-01-02 00:00:00,3,Cy,SF\n");

    {
        let _scenario = CustomFailScenario::setup(&[(WRITE_DATASET__BEFORE_COMMIT, "return")]);
        let err = job_for(&dir, "LOAD001.csv").run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    }
    assert!(dir.file_names("output").is_empty());

    let _scenario = CustomFailScenario::setup(&[]);
    let err = job(&dir).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingSnapshot);
    assert!(dir.file_names("output").is_empty());
}
