//! Location cache for Graft workspaces.
//!
//! The cache maps node paths to [`Location`](graft_types::Location)s and
//! parent paths to their ordered child lists, separately for every
//! [`WorkspaceId`](graft_types::WorkspaceId). Paths address nodes by name and
//! same-name-sibling index, so moving or removing a node silently renames its
//! later same-name siblings. The cache keeps itself consistent with that:
//!
//! - the removed node and everything cached beneath it is evicted;
//! - later same-name siblings in a cached child list are shifted down by one
//!   index, and their locations are re-keyed;
//! - anything cached beneath a renumbered sibling is evicted, since its path
//!   is now stale.
//!
//! # Modules
//!
//! - [`workspace`]: single-workspace state and the invalidation rules
//! - [`cache`]: the thread-safe, workspace-partitioned [`LocationCache`]

pub mod cache;
pub mod workspace;

pub use cache::LocationCache;
pub use workspace::{Invalidation, WorkspaceCache};
