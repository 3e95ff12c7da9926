use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a workspace.
///
/// All cache entries are namespaced by a `WorkspaceId`; entries under
/// different ids never interact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(u64);

impl WorkspaceId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for WorkspaceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Debug for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkspaceId({})", self.0)
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws:{}", self.0)
    }
}
