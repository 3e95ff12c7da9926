//! Cached state of a single workspace.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use graft_types::{Location, Name, Path, Segment};
use tracing::{trace, warn};

/// Locations and child lists cached for one workspace.
///
/// Both maps are keyed by [`Path`], whose ordering places every descendant of
/// a path directly after it. A whole subtree is therefore one contiguous
/// range of keys.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceCache {
    locations: BTreeMap<Path, Location>,
    children: BTreeMap<Path, Vec<Location>>,
}

/// Counts of what a structural change did to the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub renumbered: usize,
    pub evicted: usize,
}

impl Invalidation {
    pub fn changed(&self) -> bool {
        self.renumbered > 0 || self.evicted > 0
    }
}

impl WorkspaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self, path: &Path) -> Option<&Location> {
        self.locations.get(path)
    }

    pub fn add_location(&mut self, location: Location) {
        self.locations.insert(location.path().clone(), location);
    }

    pub fn children(&self, parent: &Path) -> Option<&[Location]> {
        self.children.get(parent).map(Vec::as_slice)
    }

    /// Replace the child list of `parent`; `None` forgets it.
    ///
    /// A list that is not in valid sibling order is not cached.
    pub fn set_children(&mut self, parent: &Path, children: Option<Vec<Location>>) {
        match children {
            Some(list) if is_sibling_order(parent, &list) => {
                self.children.insert(parent.clone(), list);
            }
            Some(list) => {
                warn!(%parent, len = list.len(), "refusing to cache child list out of sibling order");
                self.children.remove(parent);
            }
            None => {
                self.children.remove(parent);
            }
        }
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn child_list_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.children.is_empty()
    }

    /// Account for the node at `old` leaving its parent.
    ///
    /// Drops everything cached at or below `old`, shifts later same-name
    /// siblings down by one index in the parent's child list (updating their
    /// locations) and evicts anything cached below those siblings.
    pub fn detach(&mut self, old: &Path) -> Invalidation {
        let mut result = Invalidation {
            renumbered: 0,
            evicted: self.evict_at_or_below(old),
        };
        let (Some(parent), Some(removed)) = (old.parent(), old.last_segment()) else {
            return result;
        };

        // Later same-name siblings change paths; nothing cached for them survives as is.
        result.evicted += self.evict_later_siblings(&parent, removed);

        let Some(siblings) = self.children.get_mut(&parent) else {
            return result;
        };
        if let Some(pos) = siblings
            .iter()
            .position(|child| child.path().last_segment() == Some(removed))
        {
            siblings.remove(pos);
            result.evicted += 1;
        }

        let mut moved = Vec::new();
        let mut broken = false;
        for child in siblings.iter_mut() {
            let Some(segment) = child.path().last_segment() else {
                continue;
            };
            if segment.name() != removed.name() || segment.index() <= removed.index() {
                continue;
            }
            match child.path().with_last_index(segment.index() - 1) {
                Ok(Some(path)) => {
                    *child = child.with_path(path);
                    moved.push(child.clone());
                }
                _ => broken = true,
            }
        }
        if broken {
            self.children.remove(&parent);
            result.evicted += 1;
            return result;
        }
        result.renumbered = moved.len();
        for location in moved {
            self.add_location(location);
        }
        result
    }

    /// Forget the child list of `parent`. Returns whether one was cached.
    pub fn forget_children(&mut self, parent: &Path) -> bool {
        self.children.remove(parent).is_some()
    }

    /// Forget the location and child list cached at exactly `path`.
    pub fn forget(&mut self, path: &Path) -> usize {
        usize::from(self.locations.remove(path).is_some())
            + usize::from(self.children.remove(path).is_some())
    }

    /// Evict every entry keyed at or below `root`.
    pub fn evict_at_or_below(&mut self, root: &Path) -> usize {
        let evicted = drain_range(&mut self.locations, root, |path| path.is_at_or_below(root))
            + drain_range(&mut self.children, root, |path| path.is_at_or_below(root));
        if evicted > 0 {
            trace!(%root, evicted, "evicted subtree");
        }
        evicted
    }

    fn evict_later_siblings(&mut self, parent: &Path, removed: &Segment) -> usize {
        let Some(start) = removed
            .index()
            .checked_add(1)
            .and_then(|next| parent.child(removed.name().clone(), next).ok())
        else {
            return 0;
        };
        let depth = parent.len();
        let name = removed.name();
        let is_later_sibling = |path: &Path| {
            parent.is_ancestor_of(path) && path.segments()[depth].name() == name
        };
        drain_range(&mut self.locations, &start, is_later_sibling)
            + drain_range(&mut self.children, &start, is_later_sibling)
    }

    /// Text rendering of everything cached, in path order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "locations ({}):", self.locations.len());
        for location in self.locations.values() {
            let _ = writeln!(out, "  {location}");
        }
        let _ = writeln!(out, "children ({}):", self.children.len());
        for (parent, children) in &self.children {
            let names: Vec<String> = children
                .iter()
                .map(|child| match child.path().last_segment() {
                    Some(segment) => segment.to_string(),
                    None => child.path().to_string(),
                })
                .collect();
            let _ = writeln!(out, "  {parent} -> [{}]", names.join(", "));
        }
        out
    }
}

/// Remove the contiguous run of keys starting at `start` that satisfy `keep_going`.
fn drain_range<V>(
    map: &mut BTreeMap<Path, V>,
    start: &Path,
    keep_going: impl Fn(&Path) -> bool,
) -> usize {
    let doomed: Vec<Path> = map
        .range(start..)
        .map(|(path, _)| path)
        .take_while(|path| keep_going(path))
        .cloned()
        .collect();
    for path in &doomed {
        map.remove(path);
    }
    doomed.len()
}

/// Children all sit directly under `parent`, and each name's indexes run 1, 2, 3...
fn is_sibling_order(parent: &Path, children: &[Location]) -> bool {
    let mut next: HashMap<&Name, u32> = HashMap::new();
    children.iter().all(|child| {
        let path = child.path();
        match (path.parent(), path.last_segment()) {
            (Some(p), Some(segment)) if &p == parent => {
                let expected = next.entry(segment.name()).or_insert(1);
                if segment.index() == *expected {
                    *expected += 1;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    })
}
