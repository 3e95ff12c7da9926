//! Thread-safe location cache partitioned by workspace.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use graft_types::{Location, Path, WorkspaceId};
use tracing::debug;

use crate::workspace::WorkspaceCache;

/// Path-indexed cache of node locations and child lists, partitioned by workspace.
///
/// Every workspace has its own lock, so threads working in different
/// workspaces never contend beyond the brief lookup of the partition.
/// Compound operations ([`move_node`](Self::move_node),
/// [`remove_branch`](Self::remove_branch)) hold the workspace's write lock
/// for their whole duration, so readers never see them half applied.
///
/// The cache never fails: anything it does not know is reported as `None`.
#[derive(Debug, Default)]
pub struct LocationCache {
    workspaces: RwLock<HashMap<WorkspaceId, Arc<RwLock<WorkspaceCache>>>>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, workspace: WorkspaceId) -> Option<Arc<RwLock<WorkspaceCache>>> {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&workspace)
            .cloned()
    }

    fn partition_or_create(&self, workspace: WorkspaceId) -> Arc<RwLock<WorkspaceCache>> {
        if let Some(existing) = self.partition(workspace) {
            return existing;
        }
        let mut map = self
            .workspaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(workspace).or_default())
    }

    fn read<T>(&self, workspace: WorkspaceId, f: impl FnOnce(&WorkspaceCache) -> T) -> Option<T> {
        let partition = self.partition(workspace)?;
        let cache = partition.read().unwrap_or_else(PoisonError::into_inner);
        Some(f(&cache))
    }

    fn write<T>(&self, workspace: WorkspaceId, f: impl FnOnce(&mut WorkspaceCache) -> T) -> T {
        let partition = self.partition_or_create(workspace);
        let mut cache = partition.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut cache)
    }

    /// The cached location at exactly `path`.
    pub fn get_location_for(&self, workspace: WorkspaceId, path: &Path) -> Option<Location> {
        self.read(workspace, |cache| cache.location(path).cloned())
            .flatten()
    }

    /// Cache `location` under its path, replacing whatever was there.
    pub fn add_new_node(&self, workspace: WorkspaceId, location: Location) {
        self.write(workspace, |cache| cache.add_location(location));
    }

    /// The cached children of `parent`, in sibling order.
    ///
    /// `None` means unknown; `Some(vec![])` means known to have no children.
    pub fn get_all_children(&self, workspace: WorkspaceId, parent: &Path) -> Option<Vec<Location>> {
        self.read(workspace, |cache| cache.children(parent).map(<[Location]>::to_vec))
            .flatten()
    }

    /// Replace the children of `parent`. `None` resets them to unknown.
    pub fn set_all_children(
        &self,
        workspace: WorkspaceId,
        parent: &Path,
        children: Option<Vec<Location>>,
    ) {
        if children.is_none() && self.partition(workspace).is_none() {
            return;
        }
        self.write(workspace, |cache| cache.set_children(parent, children));
    }

    /// Account for a node moving from `old` to `new`.
    ///
    /// Later same-name siblings of the old location are renumbered in the
    /// cached child list and their locations updated; everything cached at or
    /// below the old location and below the renumbered siblings is evicted,
    /// as is the child list of the new parent. `known_sns_index` is the new
    /// index when the caller knows it; the destination list is evicted either
    /// way.
    ///
    /// Returns whether any cached state changed.
    pub fn move_node(
        &self,
        workspace: WorkspaceId,
        old: &Location,
        known_sns_index: Option<u32>,
        new: &Location,
    ) -> bool {
        let Some(partition) = self.partition(workspace) else {
            return false;
        };
        let mut cache = partition.write().unwrap_or_else(PoisonError::into_inner);
        let mut result = cache.detach(old.path());
        result.evicted += cache.evict_at_or_below(new.path());
        if let Some(new_parent) = new.path().parent() {
            result.evicted += usize::from(cache.forget_children(&new_parent));
        }
        debug!(
            %workspace,
            from = %old.path(),
            to = %new.path(),
            ?known_sns_index,
            renumbered = result.renumbered,
            evicted = result.evicted,
            "moved node"
        );
        result.changed()
    }

    /// Account for the removal of a subtree.
    ///
    /// `branch` lists the root of the removed subtree first, followed by any
    /// descendants the caller knows about. The root is detached from its
    /// parent exactly as in [`move_node`](Self::move_node); every listed
    /// location is then evicted.
    ///
    /// Returns whether any cached state changed.
    pub fn remove_branch(&self, workspace: WorkspaceId, branch: &[Location]) -> bool {
        let Some((root, _)) = branch.split_first() else {
            return false;
        };
        let Some(partition) = self.partition(workspace) else {
            return false;
        };
        let mut cache = partition.write().unwrap_or_else(PoisonError::into_inner);
        let mut result = cache.detach(root.path());
        for location in branch {
            result.evicted += cache.forget(location.path());
        }
        debug!(
            %workspace,
            root = %root.path(),
            listed = branch.len(),
            renumbered = result.renumbered,
            evicted = result.evicted,
            "removed branch"
        );
        result.changed()
    }

    /// Text rendering of one workspace's cached state.
    pub fn dump(&self, workspace: WorkspaceId) -> String {
        self.read(workspace, WorkspaceCache::render)
            .unwrap_or_default()
    }

    /// Drop everything cached for `workspace`. Returns whether it existed.
    pub fn clear_workspace(&self, workspace: WorkspaceId) -> bool {
        let removed = self
            .workspaces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&workspace)
            .is_some();
        if removed {
            debug!(%workspace, "cleared workspace cache");
        }
        removed
    }

    /// Number of workspaces with a cache partition.
    pub fn workspace_count(&self) -> usize {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
