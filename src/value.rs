//! Value trees
//!
//! The in-memory representation of one record: a tree of scalars,
//! collections, multi-typed slots, and embedded objects, keyed by field
//! storage tags. The writer flattens a [`ValueTree`] into storage operations
//! and the readers rebuild one from sorted cells.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::path::{PathSegment, PropertyPath};

/// A single value node.
///
/// Scalar variants derive a total order that agrees with their sortable byte
/// encoding (big-endian, sign-biased for signed numbers), so `BTreeMap` /
/// `BTreeSet` iteration already yields storage order for collections over
/// non-reversed fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Absent placeholder. Never written to storage; readers use it while a
    /// multi-type slot is open but its inner value has not arrived yet.
    Null,

    /// Integer, stored at the schema-declared width.
    Number(i64),

    /// Milliseconds-since-epoch instant (8-byte unsigned).
    Time(u64),

    /// UTF-8 text.
    Text(String),

    /// Opaque bytes.
    Blob(Vec<u8>),

    /// Boolean (single byte).
    Bool(bool),

    /// Ordered list of element values.
    List(Vec<Value>),

    /// Set of scalar members.
    Set(BTreeSet<Value>),

    /// Map from scalar keys to values.
    Map(BTreeMap<Value, Value>),

    /// Multi-typed slot: the selected variant's stable index plus the value.
    Multi { tag: u8, value: Box<Value> },

    /// Embedded object (nested model instance).
    Object(ValueTree),
}

impl Value {
    /// Human-readable kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Time(_) => "time",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Multi { .. } => "multi",
            Value::Object(_) => "object",
        }
    }

    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One record: field storage tag → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueTree {
    fields: BTreeMap<u8, Value>,
}

impl ValueTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field by storage tag.
    pub fn set(&mut self, tag: u8, value: Value) {
        self.fields.insert(tag, value);
    }

    /// Builder-style set.
    pub fn with(mut self, tag: u8, value: Value) -> Self {
        self.set(tag, value);
        self
    }

    /// Get a field by storage tag.
    pub fn get(&self, tag: u8) -> Option<&Value> {
        self.fields.get(&tag)
    }

    /// Mutable access by storage tag.
    pub fn get_mut(&mut self, tag: u8) -> Option<&mut Value> {
        self.fields.get_mut(&tag)
    }

    /// Insert-or-open a field slot.
    pub fn entry_or(&mut self, tag: u8, default: Value) -> &mut Value {
        self.fields.entry(tag).or_insert(default)
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&u8, &Value)> {
        self.fields.iter()
    }

    /// Consume the tree in ascending tag order.
    pub fn into_fields(self) -> BTreeMap<u8, Value> {
        self.fields
    }

    /// Resolve a path against this tree, segment by segment.
    ///
    /// Returns `None` when any step is absent or has the wrong shape; the
    /// caller decides whether that is an error.
    pub fn lookup(&self, path: &PropertyPath) -> Option<&Value> {
        let mut segments = path.segments().iter();
        let first = match segments.next() {
            Some(PathSegment::Field(tag)) => self.get(*tag)?,
            Some(_) => return None,
            None => return None,
        };

        let mut current = first;
        for segment in segments {
            current = match (current, segment) {
                (Value::Object(tree), PathSegment::Field(tag)) => tree.get(*tag)?,
                (Value::List(items), PathSegment::ListIndex(i)) => items.get(*i as usize)?,
                (Value::Map(entries), PathSegment::MapKey(key)) => entries.get(key)?,
                (Value::Set(members), PathSegment::SetItem(item)) => members.get(item)?,
                (Value::Multi { tag, value }, PathSegment::TypeTag(t)) if tag == t => value,
                _ => return None,
            };
        }
        Some(current)
    }
}
