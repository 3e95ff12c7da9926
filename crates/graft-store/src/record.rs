use graft_crypto::ContentHasher;
use graft_types::{ContentHash, PropertyType, Value};

use crate::error::{StoreError, StoreResult};

/// A stored large value: hash, original length, kind and the stored bytes.
///
/// The store never interprets `data` beyond undoing compression; the
/// original value is rebuilt from `kind` and the uncompressed bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LargeValueRecord {
    pub hash: ContentHash,
    /// Uncompressed length in bytes.
    pub length: u64,
    pub kind: PropertyType,
    /// Stored bytes, zstd-compressed when `compressed` is set.
    pub data: Vec<u8>,
    pub compressed: bool,
}

impl LargeValueRecord {
    /// Build an uncompressed record from a large-value-eligible value.
    pub fn new(hash: ContentHash, kind: PropertyType, value: &Value) -> StoreResult<Self> {
        let bytes = eligible_bytes(value)?;
        Ok(Self {
            hash,
            length: bytes.len() as u64,
            kind,
            data: bytes.to_vec(),
            compressed: false,
        })
    }

    /// Build a record, compressing the bytes when that makes them smaller.
    pub fn compressed(
        hash: ContentHash,
        kind: PropertyType,
        value: &Value,
        level: i32,
    ) -> StoreResult<Self> {
        let bytes = eligible_bytes(value)?;
        let packed = zstd::encode_all(bytes, level)
            .map_err(|e| StoreError::CompressionFailed(e.to_string()))?;
        if packed.len() >= bytes.len() {
            return Self::new(hash, kind, value);
        }
        Ok(Self {
            hash,
            length: bytes.len() as u64,
            kind,
            data: packed,
            compressed: true,
        })
    }

    /// Number of bytes actually held for this record.
    pub fn stored_size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The original, uncompressed bytes.
    pub fn content(&self) -> StoreResult<Vec<u8>> {
        if !self.compressed {
            return Ok(self.data.clone());
        }
        zstd::decode_all(self.data.as_slice()).map_err(|e| StoreError::DecompressionFailed {
            hash: self.hash,
            reason: e.to_string(),
        })
    }

    /// Rebuild the value, optionally checking the content against its hash.
    pub fn to_value(&self, verify: bool) -> StoreResult<Value> {
        let content = self.content()?;
        if content.len() as u64 != self.length {
            return Err(StoreError::LengthMismatch {
                hash: self.hash,
                expected: self.length,
                actual: content.len() as u64,
            });
        }
        if verify && !ContentHasher::LARGE_VALUE.verify(&content, &self.hash) {
            return Err(StoreError::HashMismatch {
                hash: self.hash,
                computed: ContentHasher::LARGE_VALUE.hash(&content),
            });
        }
        Ok(Value::from_large_value_bytes(self.kind, content)?)
    }
}

fn eligible_bytes(value: &Value) -> StoreResult<&[u8]> {
    value.large_value_bytes().ok_or_else(|| {
        StoreError::InvalidValue(graft_types::TypeError::NotLargeValueEligible {
            kind: value.property_type().to_string(),
        })
    })
}
