use graft_types::{ContentHash, TypeError};

/// Errors from large value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {hash}: stored content hashes to {computed}")]
    HashMismatch {
        hash: ContentHash,
        computed: ContentHash,
    },

    /// The stored content does not have the length the caller expected.
    #[error("length mismatch for {hash}: expected {expected} bytes, found {actual}")]
    LengthMismatch {
        hash: ContentHash,
        expected: u64,
        actual: u64,
    },

    /// The value kind or bytes are not valid for a large value record.
    #[error("invalid large value: {0}")]
    InvalidValue(#[from] TypeError),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed for {hash}: {reason}")]
    DecompressionFailed { hash: ContentHash, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
