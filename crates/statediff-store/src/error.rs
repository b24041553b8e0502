use std::path::PathBuf;

/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Keys must contain at least one byte.
    #[error("empty keys are not allowed")]
    EmptyKey,

    /// The store was closed; no further operations are possible.
    #[error("store is closed")]
    Closed,

    /// The store directory does not exist.
    #[error("store not found at {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a store directory.
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Writes were attempted on a store opened read-only.
    #[error("store at {} is read-only", .0.display())]
    ReadOnly(PathBuf),

    /// The backend found damaged data on disk.
    #[error("store data is corrupt: {0}")]
    Corrupt(String),

    /// Any other failure reported by the storage backend.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        match err.kind() {
            rocksdb::ErrorKind::Corruption => Self::Corrupt(err.into_string()),
            _ => Self::Backend(err.into_string()),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
