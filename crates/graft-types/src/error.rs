use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid same-name-sibling index {0}: indexes start at 1")]
    InvalidIndex(u32),

    #[error("invalid decimal literal: {0:?}")]
    InvalidDecimal(String),

    #[error("unknown property type code: {0}")]
    UnknownPropertyType(u8),

    #[error("{kind} values cannot be stored as large values")]
    NotLargeValueEligible { kind: String },

    #[error("invalid value bytes: {0}")]
    InvalidValueBytes(String),
}
