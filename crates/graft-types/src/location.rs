use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::path::Path;

/// The resolved identity of a node: its current path plus an optional stable
/// identifier.
///
/// Locations are immutable; a path change produces a new `Location` via
/// [`Location::with_path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    path: Path,
    uuid: Option<Uuid>,
}

impl Location {
    /// A location known only by path.
    pub fn new(path: Path) -> Self {
        Self { path, uuid: None }
    }

    /// A location with both a path and an identifier.
    pub fn with_uuid(path: Path, uuid: Uuid) -> Self {
        Self {
            path,
            uuid: Some(uuid),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    /// The same node at a different path.
    pub fn with_path(&self, path: Path) -> Self {
        Self {
            path,
            uuid: self.uuid,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uuid {
            Some(uuid) => write!(f, "{} ({uuid})", self.path),
            None => write!(f, "{}", self.path),
        }
    }
}
