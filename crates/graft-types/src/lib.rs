//! Foundation types for Graft.
//!
//! This crate provides the identity, path, and value types shared by the
//! location cache and the property serializer. Every other Graft crate depends
//! on `graft-types`.
//!
//! # Key Types
//!
//! - [`WorkspaceId`]: Namespace for all cached state of one workspace
//! - [`Name`] / [`Segment`] / [`Path`]: Absolute paths of same-name-sibling segments
//! - [`Location`]: A node's current path plus optional stable identifier
//! - [`ContentHash`]: Content-addressed key for externalized large values
//! - [`PropertyType`] / [`Value`]: Closed set of property value kinds
//! - [`Property`]: A name plus zero or more typed values

pub mod error;
pub mod hash;
pub mod location;
pub mod name;
pub mod path;
pub mod property;
pub mod value;
pub mod workspace;

pub use error::TypeError;
pub use hash::ContentHash;
pub use location::Location;
pub use name::Name;
pub use path::{Path, Segment};
pub use property::Property;
pub use value::{Decimal, PropertyType, Reference, Value};
pub use workspace::WorkspaceId;
