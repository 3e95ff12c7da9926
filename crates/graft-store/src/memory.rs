use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use graft_types::{ContentHash, PropertyType, Value};
use tracing::{debug, trace};

use crate::config::LargeValueConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::LargeValueRecord;
use crate::traits::LargeValues;

/// In-memory, HashMap-based large value store.
///
/// Records are held behind a `RwLock` for concurrent access and are
/// deduplicated by content hash. When the config asks for it, stored bytes
/// are zstd-compressed.
pub struct InMemoryLargeValueStore {
    config: LargeValueConfig,
    records: RwLock<HashMap<ContentHash, LargeValueRecord>>,
}

impl InMemoryLargeValueStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LargeValueConfig::default())
    }

    pub fn with_config(config: LargeValueConfig) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty store externalizing values of at least `minimum_size` bytes.
    pub fn with_minimum_size(minimum_size: u64) -> Self {
        Self::with_config(LargeValueConfig::with_minimum_size(minimum_size))
    }

    pub fn config(&self) -> &LargeValueConfig {
        &self.config
    }

    /// Number of distinct records currently stored.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(hash)
    }

    /// A copy of the stored record for `hash`.
    pub fn record(&self, hash: &ContentHash) -> Option<LargeValueRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
            .cloned()
    }

    /// Bytes held across all records, after compression.
    pub fn total_stored_bytes(&self) -> u64 {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(LargeValueRecord::stored_size)
            .sum()
    }

    /// Sorted list of every stored hash.
    pub fn hashes(&self) -> Vec<ContentHash> {
        let map = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut hashes: Vec<ContentHash> = map.keys().copied().collect();
        hashes.sort();
        hashes
    }

    /// Remove a record. Returns `true` if it was present.
    pub fn delete(&self, hash: &ContentHash) -> StoreResult<bool> {
        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let removed = map.remove(hash).is_some();
        if removed {
            debug!(hash = %hash.short_hex(), "deleted large value");
        }
        Ok(removed)
    }

    /// Remove every record whose hash is in `hashes`, returning how many went.
    pub fn delete_all<'a>(
        &self,
        hashes: impl IntoIterator<Item = &'a ContentHash>,
    ) -> StoreResult<usize> {
        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let removed = hashes
            .into_iter()
            .filter(|hash| map.remove(hash).is_some())
            .count();
        debug!(removed, remaining = map.len(), "deleted large values");
        Ok(removed)
    }

    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for InMemoryLargeValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LargeValues for InMemoryLargeValueStore {
    fn minimum_size(&self) -> u64 {
        self.config.minimum_size
    }

    fn read(&self, hash: &ContentHash, length: u64) -> StoreResult<Option<Value>> {
        let record = {
            let map = self
                .records
                .read()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            match map.get(hash) {
                Some(record) => record.clone(),
                None => {
                    trace!(hash = %hash.short_hex(), "large value not found");
                    return Ok(None);
                }
            }
        };
        if record.length != length {
            return Err(StoreError::LengthMismatch {
                hash: *hash,
                expected: length,
                actual: record.length,
            });
        }
        record.to_value(self.config.verify_reads).map(Some)
    }

    fn write(
        &self,
        hash: &ContentHash,
        length: u64,
        kind: PropertyType,
        value: &Value,
    ) -> StoreResult<()> {
        if self.contains(hash) {
            trace!(hash = %hash.short_hex(), "large value already stored");
            return Ok(());
        }
        // Compress outside the lock.
        let record = if self.config.compress {
            LargeValueRecord::compressed(*hash, kind, value, self.config.compression_level)?
        } else {
            LargeValueRecord::new(*hash, kind, value)?
        };
        if record.length != length {
            return Err(StoreError::LengthMismatch {
                hash: *hash,
                expected: length,
                actual: record.length,
            });
        }

        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        if map.contains_key(hash) {
            return Ok(());
        }
        debug!(
            hash = %hash.short_hex(),
            %kind,
            length,
            stored = record.stored_size(),
            compressed = record.compressed,
            "stored large value"
        );
        map.insert(*hash, record);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryLargeValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLargeValueStore")
            .field("minimum_size", &self.config.minimum_size)
            .field("record_count", &self.len())
            .finish()
    }
}
