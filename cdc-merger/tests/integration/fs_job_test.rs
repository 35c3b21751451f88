use cdc_config::shared::{DuplicateInsertPolicy, JobConfig};
use cdc_merger::error::{CdcResult, ErrorKind};
use cdc_merger::job::{CdcJob, JobContext, JobSummary};
use cdc_merger::loader::LoadMode;
use cdc_merger::store::OUTPUT_PART_NAME;
use cdc_merger::store::fs::FsDatasetStore;
use cdc_merger::test_utils::dir::TestDir;
use cdc_telemetry::tracing::init_test_tracing;

async fn run(dir: &TestDir, input_file: &str, config: JobConfig) -> CdcResult<JobSummary> {
    let context = JobContext::new(config, input_file, FsDatasetStore::new(dir.path()))?;
    let job = CdcJob::new(context);
    let summary = job.run().await;
    job.shutdown().await?;
    summary
}

#[tokio::test(flavor = "multi_thread")]
async fn initial_load_then_change_batch_end_to_end() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write("LOAD00000001.csv", "2024-01-01 00:00:00,1,Alice,NY\n");
    dir.write(
        "20240102-000000.csv",
        "U,2024-01-02 00:00:00,1,Alicia,NY\nI,2024-01-02 00:00:05,2,Bob,LA\n",
    );

    let summary = run(&dir, "LOAD00000001.csv", JobConfig::default())
        .await
        .unwrap();
    assert_eq!(summary.mode, LoadMode::InitialLoad);
    assert_eq!(dir.read("output/part-00000.csv"), "2024-01-01 00:00:00,1,Alice,NY\n");

    let summary = run(&dir, "20240102-000000.csv", JobConfig::default())
        .await
        .unwrap();
    assert_eq!(summary.mode, LoadMode::Incremental);
    let merge = summary.merge.unwrap();
    assert_eq!((merge.inserts, merge.updates, merge.deletes), (1, 1, 0));

    insta::assert_snapshot!(dir.read("output/part-00000.csv").trim_end(), @r"
    2024-01-02 00:00:00,1,Alicia,NY
    2024-01-02 00:00:05,2,Bob,LA
    ");
    assert_eq!(dir.file_names("output"), vec![OUTPUT_PART_NAME.to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn incremental_run_reads_multi_part_output() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write("output/part-00000-5f1c.csv", "2024-01-01 00:00:00,1,Alice,NY\n");
    dir.write("output/part-00001-5f1c.csv", "2024-01-01 00:00:00,2,Bob,LA\n");
    dir.write("output/.part-00000-5f1c.csv.crc", "garbage");
    dir.write("output/_SUCCESS", "");
    dir.write("batch.csv", "D,2024-01-02 00:00:00,1,Alice,NY\n");

    let summary = run(&dir, "batch.csv", JobConfig::default()).await.unwrap();

    assert_eq!(summary.snapshot_rows_read, 2);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(dir.file_names("output"), vec![OUTPUT_PART_NAME.to_string()]);
    assert_eq!(dir.read("output/part-00000.csv"), "2024-01-01 00:00:00,2,Bob,LA\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn incremental_run_without_snapshot_fails() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write("batch.csv", "I,2024-01-02 00:00:00,1,Alice,NY\n");

    let err = run(&dir, "batch.csv", JobConfig::default()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingSnapshot);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_input_file_fails() {
    init_test_tracing();
    let dir = TestDir::new();

    let err = run(&dir, "LOAD00000001.csv", JobConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingInput);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_rows_fail_without_touching_output() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write("output/part-00000.csv", "2024-01-01 00:00:00,1,Alice,NY\n");
    dir.write("wrong-width.csv", "I,2024-01-02 00:00:00,2,Bob\n");
    dir.write("bad-tag.csv", "X,2024-01-02 00:00:00,2,Bob,LA\n");
    dir.write("bad-time.csv", "I,tomorrow,2,Bob,LA\n");

    for (file, kind) in [
        ("wrong-width.csv", ErrorKind::SchemaViolation),
        ("bad-tag.csv", ErrorKind::InvalidOperation),
        ("bad-time.csv", ErrorKind::SchemaViolation),
    ] {
        let err = run(&dir, file, JobConfig::default()).await.unwrap_err();
        assert_eq!(err.kind(), kind, "{file}");
    }

    assert_eq!(dir.read("output/part-00000.csv"), "2024-01-01 00:00:00,1,Alice,NY\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_insert_rejected_unless_allowed() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write("output/part-00000.csv", "2024-01-01 00:00:00,1,Alice,NY\n");
    dir.write("batch.csv", "I,2024-01-02 00:00:00,1,Alice,Boston\n");

    let err = run(&dir, "batch.csv", JobConfig::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateEntity);

    let mut config = JobConfig::default();
    config.merge.duplicate_insert = DuplicateInsertPolicy::Allow;
    let summary = run(&dir, "batch.csv", config).await.unwrap();

    assert_eq!(summary.rows_written, 2);
    assert_eq!(
        dir.read("output/part-00000.csv"),
        "2024-01-01 00:00:00,1,Alice,NY\n2024-01-02 00:00:00,1,Alice,Boston\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn custom_format_and_schema() {
    init_test_tracing();
    let dir = TestDir::new();
    dir.write(
        "in/LOAD_customers.psv",
        "tx_commit_time|CustomerID|Email\n2024-01-01T08:00:00Z|c-1|a@example.com\n",
    );

    let mut config = JobConfig::default();
    config.format.delimiter = '|';
    config.format.has_header = true;
    config.schema.entity_id_column = "CustomerID".to_string();
    config.schema.attribute_columns = vec!["Email".to_string()];
    config.storage.output_dir = "customers/current".to_string();

    run(&dir, "in/LOAD_customers.psv", config).await.unwrap();

    insta::assert_snapshot!(dir.read("customers/current/part-00000.csv").trim_end(), @r"
    tx_commit_time|CustomerID|Email
    2024-01-01 08:00:00|c-1|a@example.com
    ");
}
