//! In-memory store for tests and embedding.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::CdcResult;
use crate::store::base::{DatasetPart, DatasetStore, OUTPUT_PART_NAME, normalize_path};

/// Keeps datasets in a shared map keyed by normalized path.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatasetStore {
    datasets: Arc<Mutex<HashMap<String, Vec<DatasetPart>>>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a single-file dataset at `path`.
    pub async fn put_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let path = normalize_path(path);
        let part = DatasetPart::new(path.clone(), contents.into());
        self.datasets.lock().await.insert(path, vec![part]);
    }

    /// Stores a dataset made of `parts` at `path`.
    pub async fn put_parts(&self, path: &str, parts: Vec<DatasetPart>) {
        self.datasets.lock().await.insert(normalize_path(path), parts);
    }

    /// Returns the concatenated parts of the dataset at `path`.
    pub async fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let datasets = self.datasets.lock().await;
        datasets
            .get(&normalize_path(path))
            .map(|parts| parts.iter().flat_map(|part| part.contents.clone()).collect())
    }
}

impl DatasetStore for MemoryDatasetStore {
    fn name() -> &'static str {
        "memory"
    }

    async fn read_dataset(&self, path: &str) -> CdcResult<Option<Vec<DatasetPart>>> {
        let datasets = self.datasets.lock().await;
        Ok(datasets.get(&normalize_path(path)).cloned())
    }

    async fn write_dataset(&self, path: &str, contents: Vec<u8>) -> CdcResult<()> {
        let path = normalize_path(path);
        info!(%path, bytes = contents.len(), "writing dataset to memory");

        let part = DatasetPart::new(format!("{path}/{OUTPUT_PART_NAME}"), contents);
        self.datasets.lock().await.insert(path, vec![part]);

        Ok(())
    }
}
