use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A uniquely named directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("cdc-merger-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).expect("failed to create test directory");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directory");
        }
        fs::write(&path, contents).expect("failed to write test file");
    }

    /// Reads `relative` as UTF-8.
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path.join(relative)).expect("failed to read test file")
    }

    /// Returns the sorted names of the files in `relative`.
    pub fn file_names(&self, relative: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path.join(relative))
            .expect("failed to list test directory")
            .map(|entry| {
                entry
                    .expect("failed to read directory entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
