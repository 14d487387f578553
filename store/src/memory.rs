use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::path;
use crate::store::Store;

/// In-memory store for tests and embedded catalogs.
///
/// `Clone` shares the underlying map, so a clone handed to the codec sees
/// every write made through the original.
///
/// Directories are implicit: they exist whenever a stored name contains
/// that prefix.
///
/// # Example
///
/// ```ignore
/// let store = MemoryStore::new();
/// store.insert("settings.toml", b"default_format = \"ron\"".to_vec());
/// assert!(store.exists("settings.toml").unwrap());
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a blob directly, bypassing name normalization.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        self.blobs.write().insert(name.into(), data);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let name = path::normalize(name)?;
        self.blobs
            .read()
            .get(&name)
            .cloned()
            .ok_or(StoreError::NotFound(name))
    }

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let name = path::normalize(name)?;
        Ok(self.blobs.read().contains_key(&name))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = path::normalize_prefix(prefix)?;
        let prefix = if prefix.is_empty() {
            prefix
        } else {
            format!("{prefix}/")
        };

        let blobs = self.blobs.read();
        let mut children = BTreeSet::new();
        for key in blobs.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let child = match rest.find('/') {
                    Some(pos) => &rest[..pos],
                    None => rest,
                };
                if !child.is_empty() {
                    children.insert(child.to_owned());
                }
            }
        }
        Ok(children.into_iter().collect())
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, name: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let name = path::normalize(name)?;
        log::debug!("MemoryStore: writing {} bytes to '{name}'", data.len());
        self.blobs.write().insert(name, data);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        let name = path::normalize(name)?;
        self.blobs
            .write()
            .remove(&name)
            .map(|_| ())
            .ok_or(StoreError::NotFound(name))
    }
}
