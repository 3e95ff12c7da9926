use graft_types::{ContentHash, PropertyType, Value};

use crate::error::StoreResult;

/// The location where large property values are stored.
///
/// Implementations must satisfy these invariants:
/// - Records are keyed by content hash; the same content always maps to the
///   same record, so writing an existing hash is a no-op.
/// - `read` returns `Ok(None)` only when the hash is unknown; callers treat
///   that as a dangling reference.
/// - Errors are propagated, never silently swallowed.
pub trait LargeValues: Send + Sync {
    /// Byte length at which a value is considered large.
    ///
    /// Values whose length is strictly below this are written inline.
    fn minimum_size(&self) -> u64;

    /// Read back a previously written value.
    fn read(&self, hash: &ContentHash, length: u64) -> StoreResult<Option<Value>>;

    /// Persist a value under its content hash.
    fn write(
        &self,
        hash: &ContentHash,
        length: u64,
        kind: PropertyType,
        value: &Value,
    ) -> StoreResult<()>;
}

/// Receives the hashes of large values a caller skipped over or dropped.
pub trait LargeValueSink {
    fn record(&mut self, hash: &ContentHash, length: u64);
}

/// A [`LargeValues`] that never externalizes anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLargeValues;

impl LargeValues for NoLargeValues {
    fn minimum_size(&self) -> u64 {
        u64::MAX
    }

    fn read(&self, _hash: &ContentHash, _length: u64) -> StoreResult<Option<Value>> {
        Ok(None)
    }

    fn write(
        &self,
        _hash: &ContentHash,
        _length: u64,
        _kind: PropertyType,
        _value: &Value,
    ) -> StoreResult<()> {
        Ok(())
    }
}
