//! Content hashing for Graft.
//!
//! Large property values are keyed by a digest of their bytes. This crate
//! wraps BLAKE3 with a domain tag so large-value keys never collide with
//! digests computed for other purposes over the same bytes.
//!
//! All crypto operations wrap established libraries: no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
