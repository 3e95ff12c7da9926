use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use graft_types::{ContentHash, PropertyType, Value};

use crate::error::StoreResult;
use crate::traits::{LargeValueSink, LargeValues};

/// A [`LargeValues`] decorator that remembers every hash read or written.
///
/// Callers use the recorded sets to learn which large values a batch of
/// properties still refers to.
pub struct RecordingLargeValues<'a> {
    delegate: &'a dyn LargeValues,
    read: Mutex<BTreeSet<ContentHash>>,
    written: Mutex<BTreeSet<ContentHash>>,
}

impl<'a> RecordingLargeValues<'a> {
    pub fn new(delegate: &'a dyn LargeValues) -> Self {
        Self {
            delegate,
            read: Mutex::new(BTreeSet::new()),
            written: Mutex::new(BTreeSet::new()),
        }
    }

    /// Hashes passed to `read`, found or not.
    pub fn read_hashes(&self) -> BTreeSet<ContentHash> {
        self.read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hashes passed to `write`.
    pub fn written_hashes(&self) -> BTreeSet<ContentHash> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LargeValues for RecordingLargeValues<'_> {
    fn minimum_size(&self) -> u64 {
        self.delegate.minimum_size()
    }

    fn read(&self, hash: &ContentHash, length: u64) -> StoreResult<Option<Value>> {
        self.read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*hash);
        self.delegate.read(hash, length)
    }

    fn write(
        &self,
        hash: &ContentHash,
        length: u64,
        kind: PropertyType,
        value: &Value,
    ) -> StoreResult<()> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*hash);
        self.delegate.write(hash, length, kind, value)
    }
}

impl std::fmt::Debug for RecordingLargeValues<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingLargeValues")
            .field("read", &self.read_hashes().len())
            .field("written", &self.written_hashes().len())
            .finish()
    }
}

/// Collects the hashes (and lengths) of large values that were skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkippedLargeValues {
    skipped: BTreeMap<ContentHash, u64>,
}

impl SkippedLargeValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.skipped.contains_key(hash)
    }

    /// Recorded length of a skipped value.
    pub fn length(&self, hash: &ContentHash) -> Option<u64> {
        self.skipped.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn hashes(&self) -> impl Iterator<Item = &ContentHash> {
        self.skipped.keys()
    }

    pub fn into_hashes(self) -> BTreeSet<ContentHash> {
        self.skipped.into_keys().collect()
    }
}

impl LargeValueSink for SkippedLargeValues {
    fn record(&mut self, hash: &ContentHash, length: u64) {
        self.skipped.insert(*hash, length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLargeValueStore;
    use graft_crypto::ContentHasher;

    #[test]
    fn recording_tracks_reads_and_writes() {
        let store = InMemoryLargeValueStore::with_minimum_size(8);
        let recording = RecordingLargeValues::new(&store);
        assert_eq!(recording.minimum_size(), 8);

        let value = Value::from("recorded content");
        let hash = ContentHasher::LARGE_VALUE.hash(value.large_value_bytes().unwrap());
        recording
            .write(&hash, 16, PropertyType::String, &value)
            .unwrap();
        let missing = ContentHash::from_hash([3; 32]);
        assert!(recording.read(&missing, 4).unwrap().is_none());
        assert_eq!(recording.read(&hash, 16).unwrap(), Some(value));

        assert_eq!(recording.written_hashes(), BTreeSet::from([hash]));
        assert_eq!(recording.read_hashes(), BTreeSet::from([hash, missing]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn skipped_values_keep_lengths() {
        let mut skipped = SkippedLargeValues::new();
        let a = ContentHash::from_hash([1; 32]);
        let b = ContentHash::from_hash([2; 32]);
        skipped.record(&a, 100);
        skipped.record(&b, 200);
        skipped.record(&a, 100);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped.length(&b), Some(200));
        assert!(skipped.contains(&a));
        assert_eq!(skipped.into_hashes(), BTreeSet::from([a, b]));
    }
}
