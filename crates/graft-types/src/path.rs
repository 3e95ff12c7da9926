//! Absolute paths made of same-name-sibling segments.
//!
//! A [`Path`] is an ordered sequence of [`Segment`]s, each a name plus a
//! 1-based same-name-sibling (SNS) index. The textual form omits the index
//! when it is 1: `/a/b/c/e[2]` has segments `a[1]`, `b[1]`, `c[1]`, `e[2]`.
//!
//! Paths order lexicographically by segment, so every descendant of a path
//! sorts directly after it. Ordered maps keyed by `Path` can therefore visit
//! a whole subtree with a single range scan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::name::Name;

/// One path segment: a name and its same-name-sibling index.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    name: Name,
    index: u32,
}

impl Segment {
    /// Create a segment; `index` must be at least 1.
    pub fn new(name: Name, index: u32) -> Result<Self, TypeError> {
        if index == 0 {
            return Err(TypeError::InvalidIndex(index));
        }
        Ok(Self { name, index })
    }

    /// Create a segment with the default index of 1.
    pub fn named(name: Name) -> Self {
        Self { name, index: 1 }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// The same segment with a different SNS index.
    pub fn with_index(&self, index: u32) -> Result<Self, TypeError> {
        Self::new(self.name.clone(), index)
    }

    fn parse(segment: &str, path: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let (name, index) = match segment.find('[') {
            Some(open) => {
                let digits = segment[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("unterminated sibling index"))?;
                let index: u32 = digits
                    .parse()
                    .map_err(|_| invalid("sibling index is not a number"))?;
                (&segment[..open], index)
            }
            None => (segment, 1),
        };
        Self::new(Name::new(name)?, index)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 1 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.index)
        }
    }
}

/// A normalized absolute path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path (`/`).
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse the textual form, e.g. `/a/b/c/e[2]`.
    pub fn parse(path: &str) -> Result<Self, TypeError> {
        let rest = path.strip_prefix('/').ok_or_else(|| TypeError::InvalidPath {
            path: path.to_string(),
            reason: "path must be absolute".into(),
        })?;
        if rest.is_empty() {
            return Ok(Self::root());
        }
        let segments = rest
            .split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(TypeError::InvalidPath {
                        path: path.to_string(),
                        reason: "empty segment".into(),
                    })
                } else {
                    Segment::parse(segment, path)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments (0 for the root).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Append one segment.
    pub fn join(&self, segment: Segment) -> Path {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Append a child segment with the given name and SNS index.
    pub fn child(&self, name: Name, index: u32) -> Result<Path, TypeError> {
        Ok(self.join(Segment::new(name, index)?))
    }

    /// This path with the last segment's SNS index replaced.
    ///
    /// Returns `None` for the root.
    pub fn with_last_index(&self, index: u32) -> Result<Option<Path>, TypeError> {
        let Some((last, parent)) = self.segments.split_last() else {
            return Ok(None);
        };
        let mut segments = parent.to_vec();
        segments.push(last.with_index(index)?);
        Ok(Some(Self { segments }))
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn is_at_or_below(&self, other: &Path) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}
