//! Property paths
//!
//! A [`PropertyPath`] names one location inside a nested, schema-typed value
//! tree: a chain of field tags, map keys, list indices, set items, and
//! multi-type tags. Paths are totally ordered segment by segment; the
//! qualifier codec guarantees that lexicographic byte order of encoded
//! qualifiers reproduces this order (with reversed-direction fields compared
//! descending on the wire).

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One step of a property path.
///
/// Only segments of the same kind ever compete as siblings (all children of
/// a list are `ListIndex`, all children of a map are `MapKey`, ...), so the
/// derived ordering across variants never decides sibling order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// A model field, identified by its fixed storage tag.
    Field(u8),

    /// The selected variant of a multi-typed field (stable enum index).
    TypeTag(u8),

    /// Position inside a list (insertion index).
    ListIndex(u32),

    /// A map entry, keyed by the decoded scalar key.
    MapKey(Value),

    /// A set member, identified by the decoded scalar item itself.
    SetItem(Value),
}

/// Ordered list of segments from a record root down to one property.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// The record root (empty path).
    pub fn root() -> Self {
        Self::default()
    }

    /// A single top-level field path.
    pub fn field(tag: u8) -> Self {
        Self {
            segments: vec![PathSegment::Field(tag)],
        }
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Extend this path by one segment, returning the child path.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the record root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The path without its final segment (root stays root).
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Prefix relation: is `prefix` an ancestor-or-self of this path?
    pub fn starts_with(&self, prefix: &PropertyPath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

/// Selection mask over paths, used by the readers to skip decoding of
/// unselected leaves.
///
/// A path is covered when it lies inside a selected subtree, or when it is
/// an ancestor of a selected path — ancestors must stay visible so their
/// container marker cells can still open the enclosing collections.
#[derive(Debug, Clone, Default)]
pub struct PathMask {
    paths: Vec<PropertyPath>,
}

impl PathMask {
    /// Build a mask selecting the given subtrees.
    pub fn new(paths: Vec<PropertyPath>) -> Self {
        Self { paths }
    }

    /// Add one selected subtree.
    pub fn select(mut self, path: PropertyPath) -> Self {
        self.paths.push(path);
        self
    }

    /// Whether the mask keeps this path.
    pub fn covers(&self, path: &PropertyPath) -> bool {
        self.paths
            .iter()
            .any(|p| path.starts_with(p) || p.starts_with(path))
    }
}
