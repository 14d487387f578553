use std::path::PathBuf;

use crate::error::StoreError;
use crate::path;
use crate::store::Store;

/// Store backed by a directory on the native filesystem.
///
/// Blob names are normalized and joined onto the root, so `..` can never
/// escape it. Parent directories are created on write.
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store is rooted at.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(path::normalize(name)?))
    }
}

impl Store for FileSystemStore {
    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        Ok(std::fs::read(self.resolve(name)?)?)
    }

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.resolve(name)?.is_file())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(path::normalize_prefix(prefix)?);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_owned());
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, name: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let full_path = self.resolve(name)?;
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!(
            "FileSystemStore: writing {} bytes to {}",
            data.len(),
            full_path.display()
        );
        std::fs::write(full_path, data)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        std::fs::remove_file(self.resolve(name)?)?;
        Ok(())
    }
}
