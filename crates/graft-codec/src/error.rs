use graft_store::StoreError;
use graft_types::{ContentHash, TypeError};

/// Errors from encoding or decoding serialized properties.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stream ended in the middle of a value.
    #[error("serialized properties are truncated")]
    Truncated,

    #[error("unknown value tag: {0:#04x}")]
    UnknownTag(u8),

    #[error("invalid UTF-8 in serialized string: {0}")]
    InvalidUtf8(String),

    /// A value decoded cleanly but does not form a valid value of its kind.
    #[error("invalid serialized value: {0}")]
    InvalidValue(String),

    /// A large value placeholder whose hash the store does not know.
    #[error("dangling large value {hash} ({length} bytes)")]
    DanglingLargeValue { hash: ContentHash, length: u64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("large value store error: {0}")]
    Store(#[from] StoreError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(err)
        }
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
