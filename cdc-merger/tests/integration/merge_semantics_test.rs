use cdc_config::shared::{DuplicateInsertPolicy, JobConfig};
use cdc_merger::job::{CdcJob, JobContext};
use cdc_merger::store::memory::MemoryDatasetStore;
use cdc_telemetry::tracing::init_test_tracing;

async fn merge(snapshot: &str, batch: &str) -> String {
    let store = MemoryDatasetStore::new();
    store.put_file("output", snapshot).await;
    store.put_file("batch.csv", batch).await;

    let context = JobContext::new(JobConfig::default(), "batch.csv", store.clone()).unwrap();
    CdcJob::new(context).run().await.unwrap();

    String::from_utf8(store.contents("output").await.unwrap()).unwrap()
}

#[tokio::test]
async fn insert_then_delete_leaves_no_row() {
    init_test_tracing();

    let output = merge(
        "",
        "I,2024-01-01 00:00:00,1,Alice,NY\nD,2024-01-01 00:00:01,1,Alice,NY\n",
    )
    .await;

    assert_eq!(output, "");
}

#[tokio::test]
async fn delete_then_insert_leaves_one_row() {
    init_test_tracing();

    let output = merge(
        "2024-01-01 00:00:00,1,Alice,NY\n",
        "D,2024-01-02 00:00:00,1,Alice,NY\nI,2024-01-02 00:00:01,1,Alice,Rome\n",
    )
    .await;

    assert_eq!(output, "2024-01-02 00:00:01,1,Alice,Rome\n");
}

#[tokio::test]
async fn empty_batch_rewrites_snapshot_unchanged() {
    init_test_tracing();
    let snapshot = "2024-01-01 00:00:00,1,Alice,NY\n2024-01-01 00:00:00,2,Bob,LA\n";

    assert_eq!(merge(snapshot, "").await, snapshot);
}

#[tokio::test]
async fn update_of_unknown_id_changes_nothing() {
    init_test_tracing();
    let snapshot = "2024-01-01 00:00:00,1,Alice,NY\n";

    assert_eq!(
        merge(snapshot, "U,2024-01-02 00:00:00,42,Nobody,Nowhere\n").await,
        snapshot
    );
}

#[tokio::test]
async fn overwrite_policy_keeps_row_position() {
    init_test_tracing();
    let store = MemoryDatasetStore::new();
    store
        .put_file(
            "output",
            "2024-01-01 00:00:00,1,Alice,NY\n2024-01-01 00:00:00,2,Bob,LA\n",
        )
        .await;
    store
        .put_file("batch.csv", "I,2024-01-03 00:00:00,1,Al,Rome\n")
        .await;

    let mut config = JobConfig::default();
    config.merge.duplicate_insert = DuplicateInsertPolicy::Overwrite;
    let context = JobContext::new(config, "batch.csv", store.clone()).unwrap();
    CdcJob::new(context).run().await.unwrap();

    assert_eq!(
        store.contents("output").await.unwrap(),
        b"2024-01-03 00:00:00,1,Al,Rome\n2024-01-01 00:00:00,2,Bob,LA\n".to_vec()
    );
}
