use crate::StoreError;

/// Trait for named byte-stream backends.
///
/// Names are normalized by the store itself (see [`path::normalize`](crate::path::normalize)):
/// forward slashes, no leading or trailing slashes, no `.` or `..` segments.
///
/// # Read vs Write
///
/// All stores implement `read`, `exists` and `list`. `write` and `delete`
/// default to [`StoreError::ReadOnly`]; stores that accept writes override
/// them and return `false` from [`is_read_only`](Store::is_read_only).
pub trait Store: Send + Sync {
    /// Read the full blob stored under `name`.
    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Check whether a blob is stored under `name`.
    fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// List the immediate children of a directory-like prefix, sorted.
    ///
    /// Returns an empty vec for prefixes with no entries. Pass `""` for the root.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Whether this store rejects writes.
    fn is_read_only(&self) -> bool {
        true
    }

    /// Store `data` under `name`, replacing any previous blob.
    fn write(&self, _name: &str, _data: Vec<u8>) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    /// Remove the blob stored under `name`.
    fn delete(&self, _name: &str) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }
}
