//! Storage Reader — Changes
//!
//! Reconstructs versioned change-sets from a multi-version cell sequence,
//! ascending by qualifier then by version. Each cell is classified against
//! the schema and bucketed under its own version; the buckets come out as
//! one ascending list of [`VersionedChanges`].
//!
//! Per version, scalar changes coalesce into a single `Change` op, deletes
//! into a single `Delete` op, and element-level list/set/map edits into one
//! aggregate op per container. A leaf edited after its multi-typed parent
//! switched variants is attributed to the leaf's own version, not the
//! type-switch version.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cell::{decode_count, Cell};
use crate::config::{CorruptCellPolicy, ReadConfig};
use crate::error::{Result, TrellisError};
use crate::path::{PathMask, PathSegment, PropertyPath};
use crate::qualifier::{decode_qualifier, decode_scalar, DecodedQualifier, QualifierTarget};
use crate::schema::{ModelSchema, SchemaRegistry};
use crate::value::Value;

/// One reconstructed change operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOp {
    /// The record came into existence at this version.
    Create,

    /// Scalar writes, coalesced across paths for one version.
    Change { entries: Vec<(PropertyPath, Value)> },

    /// Deleted paths, coalesced for one version. The record root path means
    /// the whole object was tombstoned.
    Delete { paths: Vec<PropertyPath> },

    /// Aggregate list edit: one op per list per version. `size` is present
    /// when the list's count cell was rewritten at this version (wholesale
    /// replace), absent for element-level amendments.
    ListChange {
        path: PropertyPath,
        size: Option<u32>,
        added: Vec<(u32, Value)>,
        removed: Vec<u32>,
    },

    /// Aggregate set edit, one op per set per version.
    SetChange {
        path: PropertyPath,
        size: Option<u32>,
        added: Vec<Value>,
        removed: Vec<Value>,
    },

    /// Aggregate map edit, one op per map per version.
    MapChange {
        path: PropertyPath,
        size: Option<u32>,
        put: Vec<(Value, Value)>,
        removed: Vec<Value>,
    },

    /// A multi-typed slot switched to (or was written at) this variant.
    MultiTypeChange { path: PropertyPath, type_tag: u8 },
}

/// All changes that landed at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedChanges {
    pub version: u64,
    pub changes: Vec<ChangeOp>,
}

/// Output of a change read: versions ascending, plus skipped qualifiers.
#[derive(Debug, Default)]
pub struct ChangesResult {
    pub versions: Vec<VersionedChanges>,
    pub ignored: Vec<Bytes>,
}

#[derive(Default)]
struct ListDelta {
    size: Option<u32>,
    added: Vec<(u32, Value)>,
    removed: Vec<u32>,
}

#[derive(Default)]
struct SetDelta {
    size: Option<u32>,
    added: Vec<Value>,
    removed: Vec<Value>,
}

#[derive(Default)]
struct MapDelta {
    size: Option<u32>,
    put: Vec<(Value, Value)>,
    removed: Vec<Value>,
}

#[derive(Default)]
struct Bucket {
    created: bool,
    entries: Vec<(PropertyPath, Value)>,
    deleted: Vec<PropertyPath>,
    lists: BTreeMap<PropertyPath, ListDelta>,
    sets: BTreeMap<PropertyPath, SetDelta>,
    maps: BTreeMap<PropertyPath, MapDelta>,
    multis: BTreeMap<PropertyPath, u8>,
}

/// Reconstruct versioned change-sets from multi-version cells.
///
/// `creation_version`, when known, suppresses the "field absent at
/// creation" tombstones the writer emits alongside the record's first
/// write; tombstones at any other version surface as deletes.
pub fn read_changes<I>(
    cells: I,
    model: &ModelSchema,
    registry: &SchemaRegistry,
    select: Option<&PathMask>,
    creation_version: Option<u64>,
    config: &ReadConfig,
) -> Result<ChangesResult>
where
    I: IntoIterator<Item = Cell>,
{
    let mut out = ChangesResult::default();
    let mut buckets: BTreeMap<u64, Bucket> = BTreeMap::new();
    // Cells arrive grouped per qualifier; decode each distinct qualifier
    // once.
    let mut cached: Option<(Bytes, DecodedQualifier)> = None;

    for cell in cells {
        let decoded = match &cached {
            Some((qualifier, decoded)) if *qualifier == cell.qualifier => decoded.clone(),
            _ => {
                let decoded = match decode_qualifier(&cell.qualifier, model, registry) {
                    Ok(decoded) => decoded,
                    Err(e @ TrellisError::MalformedQualifier(_)) => match config.corrupt_cells {
                        CorruptCellPolicy::Abort => return Err(e),
                        CorruptCellPolicy::Skip => {
                            warn!(error = %e, "skipping cell with malformed qualifier");
                            if config.record_ignored {
                                out.ignored.push(cell.qualifier.clone());
                            }
                            continue;
                        }
                    },
                    Err(e) => return Err(e),
                };
                cached = Some((cell.qualifier.clone(), decoded.clone()));
                decoded
            }
        };

        let (path, target) = match decoded {
            DecodedQualifier::Unknown { .. } => {
                warn!("skipping cell with unknown field tag");
                if config.record_ignored {
                    out.ignored.push(cell.qualifier.clone());
                }
                continue;
            }
            DecodedQualifier::Path { path, target } => (path, target),
        };

        if let Some(mask) = select {
            if !mask.covers(&path) {
                continue;
            }
        }

        let version = cell.version;
        let payload = match &cell.value {
            Some(payload) => payload.clone(),
            None => {
                // A tombstone written at the creation version marks a field
                // absent at creation, not a delete.
                if creation_version == Some(version) {
                    continue;
                }
                let bucket = buckets.entry(version).or_default();
                match path.last() {
                    Some(PathSegment::ListIndex(index)) => {
                        let index = *index;
                        bucket
                            .lists
                            .entry(path.parent())
                            .or_default()
                            .removed
                            .push(index);
                    }
                    Some(PathSegment::SetItem(item)) => {
                        let item = item.clone();
                        bucket
                            .sets
                            .entry(path.parent())
                            .or_default()
                            .removed
                            .push(item);
                    }
                    Some(PathSegment::MapKey(key)) => {
                        let key = key.clone();
                        bucket
                            .maps
                            .entry(path.parent())
                            .or_default()
                            .removed
                            .push(key);
                    }
                    _ => bucket.deleted.push(path),
                }
                continue;
            }
        };

        let bucket = buckets.entry(version).or_default();
        let outcome = classify_write(bucket, path, target, &payload);
        if let Err(e) = outcome {
            match config.corrupt_cells {
                CorruptCellPolicy::Abort => return Err(e),
                CorruptCellPolicy::Skip => {
                    warn!(error = %e, "skipping undecodable cell");
                    if config.record_ignored {
                        out.ignored.push(cell.qualifier.clone());
                    }
                }
            }
        }
    }

    out.versions = buckets
        .into_iter()
        .map(|(version, bucket)| VersionedChanges {
            version,
            changes: bucket.into_ops(),
        })
        .collect();
    Ok(out)
}

/// Classify one populated cell into its version bucket.
fn classify_write(
    bucket: &mut Bucket,
    path: PropertyPath,
    target: QualifierTarget,
    payload: &[u8],
) -> Result<()> {
    match target {
        QualifierTarget::Record => {
            bucket.created = true;
        }
        QualifierTarget::Scalar { ty } => {
            let value = decode_scalar(payload, &ty)?;
            match path.last() {
                Some(PathSegment::ListIndex(index)) => {
                    let index = *index;
                    bucket
                        .lists
                        .entry(path.parent())
                        .or_default()
                        .added
                        .push((index, value));
                }
                Some(PathSegment::MapKey(key)) => {
                    let key = key.clone();
                    bucket
                        .maps
                        .entry(path.parent())
                        .or_default()
                        .put
                        .push((key, value));
                }
                _ => bucket.entries.push((path, value)),
            }
        }
        QualifierTarget::SetMember { .. } => {
            if let Some(PathSegment::SetItem(item)) = path.last() {
                let item = item.clone();
                bucket
                    .sets
                    .entry(path.parent())
                    .or_default()
                    .added
                    .push(item);
            }
        }
        QualifierTarget::ListContainer => {
            let size = parse_count(payload)?;
            bucket.lists.entry(path).or_default().size = Some(size);
        }
        QualifierTarget::SetContainer { .. } => {
            let size = parse_count(payload)?;
            bucket.sets.entry(path).or_default().size = Some(size);
        }
        QualifierTarget::MapContainer => {
            let size = parse_count(payload)?;
            bucket.maps.entry(path).or_default().size = Some(size);
        }
        QualifierTarget::MultiContainer => {
            if payload.len() != 1 {
                return Err(TrellisError::InvalidCell(format!(
                    "type-tag cell payload must be 1 byte, got {}",
                    payload.len()
                )));
            }
            bucket.multis.insert(path, payload[0]);
        }
        QualifierTarget::ObjectContainer => {
            // Embed markers for nested objects carry no information beyond
            // what their leaf cells already say.
        }
    }
    Ok(())
}

fn parse_count(payload: &[u8]) -> Result<u32> {
    decode_count(payload).ok_or_else(|| {
        TrellisError::InvalidCell(format!(
            "count cell payload must be 4 bytes, got {}",
            payload.len()
        ))
    })
}

impl Bucket {
    /// Flatten one version bucket into its ordered change ops.
    fn into_ops(self) -> Vec<ChangeOp> {
        let mut changes = Vec::new();
        if self.created {
            changes.push(ChangeOp::Create);
        }
        if !self.entries.is_empty() {
            changes.push(ChangeOp::Change {
                entries: self.entries,
            });
        }
        if !self.deleted.is_empty() {
            changes.push(ChangeOp::Delete {
                paths: self.deleted,
            });
        }
        for (path, delta) in self.lists {
            changes.push(ChangeOp::ListChange {
                path,
                size: delta.size,
                added: delta.added,
                removed: delta.removed,
            });
        }
        for (path, delta) in self.sets {
            changes.push(ChangeOp::SetChange {
                path,
                size: delta.size,
                added: delta.added,
                removed: delta.removed,
            });
        }
        for (path, delta) in self.maps {
            changes.push(ChangeOp::MapChange {
                path,
                size: delta.size,
                put: delta.put,
                removed: delta.removed,
            });
        }
        for (path, type_tag) in self.multis {
            changes.push(ChangeOp::MultiTypeChange { path, type_tag });
        }
        changes
    }
}
