//! Content-addressed storage for large property values.
//!
//! Property values whose byte length reaches a configured threshold are not
//! written inline by the serializer. Instead the serializer hands them to a
//! [`LargeValues`] store keyed by the value's [`ContentHash`], and writes only
//! the hash and length inline. Identical content is stored once no matter how
//! many properties or nodes refer to it.
//!
//! # Stores and decorators
//!
//! - [`InMemoryLargeValueStore`] -- `HashMap`-based store, optionally zstd-compressed
//! - [`NoLargeValues`] -- never externalizes anything
//! - [`RecordingLargeValues`] -- records which hashes were read and written
//! - [`SkippedLargeValues`] -- a [`LargeValueSink`] collecting hashes that a
//!   caller skipped or dropped, for garbage collection
//!
//! # Design Rules
//!
//! 1. Records are immutable once written; a second write of a hash is a no-op.
//! 2. Hash collisions are not detected: equal hashes mean equal values.
//! 3. Deletion is the caller's garbage-collection decision, never implicit.
//!
//! [`ContentHash`]: graft_types::ContentHash

pub mod config;
pub mod error;
pub mod memory;
pub mod record;
pub mod recording;
pub mod traits;

pub use config::LargeValueConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryLargeValueStore;
pub use record::LargeValueRecord;
pub use recording::{RecordingLargeValues, SkippedLargeValues};
pub use traits::{LargeValueSink, LargeValues, NoLargeValues};
