use thiserror::Error;

/// Errors that can occur while reading or writing a named blob.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob is stored under the given name.
    #[error("not found: {0}")]
    NotFound(String),
    /// An IO error occurred while accessing the backing storage.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    /// The name is invalid (empty, contains `..`, or other normalization failure).
    #[error("invalid name: {0}")]
    InvalidName(String),
    /// The store does not support write operations.
    #[error("store is read-only")]
    ReadOnly,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(err.to_string())
        } else {
            StoreError::Io(err)
        }
    }
}
