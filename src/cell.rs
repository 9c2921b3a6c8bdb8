//! Storage cells and operations
//!
//! The shared vocabulary between the writer, the readers, and the backend:
//! a record is a sorted sequence of `(qualifier, version, value)` cells; the
//! writer produces `(StorageType, qualifier, value)` operations that the
//! backend persists as cells.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Kinds of storage operations the writer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    /// A scalar leaf value (or a set-member presence marker).
    Value,

    /// A list's count cell at the list's own qualifier.
    ListSize,

    /// A set's count cell at the set's own qualifier.
    SetSize,

    /// A map's count cell at the map's own qualifier.
    MapSize,

    /// A multi-typed slot's type-tag cell at the slot's own qualifier.
    TypeValue,

    /// An embedded object marker at the object's own qualifier; the record
    /// marker is an `Embed` at the empty qualifier.
    Embed,

    /// Tombstone for a whole object subtree.
    ObjectDelete,
}

/// One storage operation: what to write at which qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOp {
    pub kind: StorageType,
    pub qualifier: Bytes,
    /// `None` only for `ObjectDelete`.
    pub value: Option<Bytes>,
}

impl StorageOp {
    /// Materialize the op as a cell at the given version (test/backend
    /// convenience; real backends usually map ops to their own write batch).
    pub fn into_cell(self, version: u64) -> Cell {
        Cell {
            qualifier: self.qualifier,
            version,
            value: self.value,
        }
    }
}

/// One stored cell for a record. `value = None` is a tombstone at that
/// version. Cells for one record are ordered by qualifier, then by version
/// ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub qualifier: Bytes,
    pub version: u64,
    pub value: Option<Bytes>,
}

impl Cell {
    /// A populated cell.
    pub fn new(qualifier: impl Into<Bytes>, version: u64, value: impl Into<Bytes>) -> Self {
        Self {
            qualifier: qualifier.into(),
            version,
            value: Some(value.into()),
        }
    }

    /// A tombstone at the given version.
    pub fn tombstone(qualifier: impl Into<Bytes>, version: u64) -> Self {
        Self {
            qualifier: qualifier.into(),
            version,
            value: None,
        }
    }

    /// True for tombstones.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Encode a collection count for a size cell (4-byte unsigned big-endian).
pub fn encode_count(count: u32) -> Bytes {
    Bytes::copy_from_slice(&count.to_be_bytes())
}

/// Decode a collection count from a size cell payload.
pub fn decode_count(bytes: &[u8]) -> Option<u32> {
    let arr: [u8; 4] = bytes.try_into().ok()?;
    Some(u32::from_be_bytes(arr))
}
