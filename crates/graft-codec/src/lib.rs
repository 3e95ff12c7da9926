//! Binary serialization of property lists.
//!
//! [`Serializer`] writes a node's properties as one self-describing byte
//! stream and reads them back. Oversized string, URI and binary values are
//! moved into a [`LargeValues`](graft_store::LargeValues) store and replaced
//! inline by their content hash, so the stream stays row-sized and identical
//! content is stored once.
//!
//! Beyond plain encode/decode the serializer supports:
//!
//! - decoding a subset of properties ([`Serializer::deserialize_some_properties`])
//! - applying sparse updates in one pass while copying untouched properties
//!   byte for byte ([`Serializer::reserialize_properties`])
//! - retargeting references after a subtree is cloned
//!   ([`Serializer::adjust_reference_properties`])

pub mod error;
pub mod references;
pub mod serializer;
mod value;
mod wire;

pub use error::{CodecError, CodecResult};
pub use references::{NoReferenceValues, ReferenceValues, References};
pub use serializer::{ReserializeOutcome, Serializer, SerializerOptions};
