//! Local filesystem store.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::CdcResult;
use crate::failpoints::{WRITE_DATASET__BEFORE_COMMIT, cdc_fail_point};
use crate::store::base::{DatasetPart, DatasetStore, OUTPUT_PART_NAME, normalize_path};

/// Name of the in-progress part inside the dataset directory.
const STAGING_PART_NAME: &str = ".part-00000.csv.inprogress";

/// Stores datasets as files under a root directory.
///
/// Output datasets are directories. A write stages the new part under a hidden
/// name, renames it into place, then deletes every other file of the
/// directory, so a failure before the rename keeps the previous output.
#[derive(Debug, Clone)]
pub struct FsDatasetStore {
    root: PathBuf,
}

impl FsDatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(normalize_path(path))
    }
}

impl DatasetStore for FsDatasetStore {
    fn name() -> &'static str {
        "fs"
    }

    async fn read_dataset(&self, path: &str) -> CdcResult<Option<Vec<DatasetPart>>> {
        let full_path = self.resolve(path);

        let metadata = match tokio::fs::metadata(&full_path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %full_path.display(), "dataset does not exist");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        if metadata.is_file() {
            let contents = tokio::fs::read(&full_path).await?;
            return Ok(Some(vec![DatasetPart::new(normalize_path(path), contents)]));
        }

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&full_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_file() && is_data_part(&name) {
                names.push(name);
            }
        }
        names.sort();

        let mut parts = Vec::with_capacity(names.len());
        for name in names {
            let contents = tokio::fs::read(full_path.join(&name)).await?;
            parts.push(DatasetPart::new(
                format!("{}/{name}", normalize_path(path)),
                contents,
            ));
        }

        debug!(path = %full_path.display(), parts = parts.len(), "read dataset directory");

        Ok(Some(parts))
    }

    async fn write_dataset(&self, path: &str, contents: Vec<u8>) -> CdcResult<()> {
        let directory = self.resolve(path);
        tokio::fs::create_dir_all(&directory).await?;

        let staging_path = directory.join(STAGING_PART_NAME);
        let final_path = directory.join(OUTPUT_PART_NAME);

        if let Err(err) = stage_part(&staging_path, &contents).await {
            remove_staging(&staging_path).await;
            return Err(err.into());
        }

        if let Err(err) = cdc_fail_point(WRITE_DATASET__BEFORE_COMMIT) {
            remove_staging(&staging_path).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&staging_path, &final_path).await {
            remove_staging(&staging_path).await;
            return Err(err.into());
        }

        let mut entries = tokio::fs::read_dir(&directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name == OUTPUT_PART_NAME || !entry.file_type().await?.is_file() {
                continue;
            }
            debug!(file = %name.to_string_lossy(), "removing stale dataset file");
            tokio::fs::remove_file(entry.path()).await?;
        }

        info!(
            path = %final_path.display(),
            bytes = contents.len(),
            "dataset written"
        );

        Ok(())
    }
}

/// Parts written by us or by the previous engine; bookkeeping files
/// (`_SUCCESS`, `.crc`, hidden files) are not data.
fn is_data_part(name: &str) -> bool {
    !name.starts_with('.') && !name.starts_with('_') && !name.ends_with(".crc")
}

async fn stage_part(staging_path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(staging_path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

async fn remove_staging(staging_path: &Path) {
    if let Err(err) = tokio::fs::remove_file(staging_path).await {
        warn!(path = %staging_path.display(), error = %err, "failed to remove staged dataset part");
    }
}
