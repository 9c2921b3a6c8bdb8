//! Storage Reader — Values
//!
//! Reconstructs a value tree from an ascending-qualifier, single-version
//! cell sequence (tombstones already resolved by the backend; a `None`
//! payload here simply means absent). Containers are opened by their marker
//! cells, which the writer guarantees arrive before their children.

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use tracing::warn;

use crate::cell::{decode_count, Cell};
use crate::config::{CorruptCellPolicy, ReadConfig};
use crate::error::{Result, TrellisError};
use crate::path::{PathMask, PathSegment, PropertyPath};
use crate::qualifier::{decode_qualifier, decode_scalar, DecodedQualifier, QualifierTarget};
use crate::schema::{ModelSchema, SchemaRegistry};
use crate::value::{Value, ValueTree};

/// Output of a value read: the rebuilt tree plus the qualifiers of any
/// cells that were skipped (unknown tags, or corrupt cells under
/// [`CorruptCellPolicy::Skip`]).
#[derive(Debug, Default)]
pub struct DecodedRecord {
    pub tree: ValueTree,
    pub ignored: Vec<Bytes>,
}

/// Rebuild one record from its resolved cells.
///
/// `select` restricts which paths are materialized; unselected leaves are
/// skipped before their payloads are decoded.
pub fn read_values<I>(
    cells: I,
    model: &ModelSchema,
    registry: &SchemaRegistry,
    select: Option<&PathMask>,
    config: &ReadConfig,
) -> Result<DecodedRecord>
where
    I: IntoIterator<Item = Cell>,
{
    let mut out = DecodedRecord::default();
    // Declared collection counts, kept for truncation detection.
    let mut counts: Vec<(PropertyPath, u32)> = Vec::new();

    for cell in cells {
        let decoded = match decode_qualifier(&cell.qualifier, model, registry) {
            Ok(decoded) => decoded,
            Err(e @ TrellisError::MalformedQualifier(_)) => {
                match config.corrupt_cells {
                    CorruptCellPolicy::Abort => return Err(e),
                    CorruptCellPolicy::Skip => {
                        warn!(error = %e, "skipping cell with malformed qualifier");
                        if config.record_ignored {
                            out.ignored.push(cell.qualifier.clone());
                        }
                        continue;
                    }
                }
            }
            Err(e) => return Err(e),
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

        // A single-version stream has its tombstones resolved already; a
        // None payload is plain absence.
        let payload = match &cell.value {
            Some(payload) => payload,
            None => continue,
        };

        let outcome = match target {
            QualifierTarget::Record => Ok(()),
            QualifierTarget::Scalar { ty } => decode_scalar(payload, &ty)
                .and_then(|value| insert_value(&mut out.tree, &path, value)),
            QualifierTarget::SetMember { .. } => {
                // The member value lives in the final path segment; the
                // payload is a bare presence marker.
                insert_value(&mut out.tree, &path, Value::Null)
            }
            QualifierTarget::ListContainer => parse_count(payload).and_then(|count| {
                counts.push((path.clone(), count));
                insert_value(
                    &mut out.tree,
                    &path,
                    Value::List(Vec::with_capacity(count as usize)),
                )
            }),
            QualifierTarget::SetContainer { .. } => parse_count(payload).and_then(|count| {
                counts.push((path.clone(), count));
                insert_value(&mut out.tree, &path, Value::Set(BTreeSet::new()))
            }),
            QualifierTarget::MapContainer => parse_count(payload).and_then(|count| {
                counts.push((path.clone(), count));
                insert_value(&mut out.tree, &path, Value::Map(BTreeMap::new()))
            }),
            QualifierTarget::MultiContainer => parse_type_tag(payload).and_then(|tag| {
                insert_value(
                    &mut out.tree,
                    &path,
                    Value::Multi {
                        tag,
                        value: Box::new(Value::Null),
                    },
                )
            }),
            QualifierTarget::ObjectContainer => {
                insert_value(&mut out.tree, &path, Value::Object(ValueTree::new()))
            }
        };

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

    // Truncation detection: every declared count must match what actually
    // arrived. Pointless under a selection mask, which drops children on
    // purpose.
    if config.validate_counts && select.is_none() {
        for (path, declared) in counts {
            let observed = match out.tree.lookup(&path) {
                Some(Value::List(items)) => items.len(),
                Some(Value::Set(members)) => members.len(),
                Some(Value::Map(entries)) => entries.len(),
                _ => continue,
            };
            if observed != declared as usize {
                return Err(TrellisError::InvalidCell(format!(
                    "collection at {path:?} declared {declared} items but {observed} arrived"
                )));
            }
        }
    }

    Ok(out)
}

fn parse_count(payload: &[u8]) -> Result<u32> {
    decode_count(payload).ok_or_else(|| {
        TrellisError::InvalidCell(format!(
            "count cell payload must be 4 bytes, got {}",
            payload.len()
        ))
    })
}

fn parse_type_tag(payload: &[u8]) -> Result<u8> {
    if payload.len() != 1 {
        return Err(TrellisError::InvalidCell(format!(
            "type-tag cell payload must be 1 byte, got {}",
            payload.len()
        )));
    }
    Ok(payload[0])
}

/// Place `value` at `path`, opening intermediate containers as needed.
///
/// Iterative descent (explicit loop, no language recursion) so pathological
/// nesting depth cannot overflow the call stack.
pub(crate) fn insert_value(tree: &mut ValueTree, path: &PropertyPath, value: Value) -> Result<()> {
    let segments = path.segments();

    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            // Root replacement; only a whole object fits here.
            return match value {
                Value::Object(t) => {
                    *tree = t;
                    Ok(())
                }
                other => Err(TrellisError::InvalidCell(format!(
                    "{} value at the record root",
                    other.kind()
                ))),
            };
        }
    };

    let tag = match first {
        PathSegment::Field(tag) => *tag,
        other => {
            return Err(TrellisError::InvalidCell(format!(
                "path must start at a field, got {other:?}"
            )));
        }
    };

    if rest.is_empty() {
        tree.set(tag, value);
        return Ok(());
    }

    let mut slot: &mut Value = tree.entry_or(tag, Value::Null);
    for (i, segment) in rest.iter().enumerate() {
        let is_last = i + 1 == rest.len();
        coerce_slot(slot, segment);
        if is_last {
            return apply_leaf(slot, segment, value);
        }
        slot = match (slot, segment) {
            (Value::Object(t), PathSegment::Field(tag)) => t.entry_or(*tag, Value::Null),
            (Value::List(items), PathSegment::ListIndex(index)) => {
                let index = *index as usize;
                if index >= items.len() {
                    items.resize(index + 1, Value::Null);
                }
                &mut items[index]
            }
            (Value::Map(entries), PathSegment::MapKey(key)) => {
                entries.entry(key.clone()).or_insert(Value::Null)
            }
            (Value::Multi { value, .. }, PathSegment::TypeTag(_)) => value.as_mut(),
            (slot, segment) => {
                return Err(TrellisError::InvalidCell(format!(
                    "segment {segment:?} cannot descend into {} value",
                    slot.kind()
                )));
            }
        };
    }
    unreachable!("rest is non-empty; the loop returns at the last segment");
}

/// Reshape a slot so the next segment can descend into it. Marker cells
/// normally arrive first and set the shape; this covers masked reads where
/// only a subtree was selected, plus Null placeholders.
fn coerce_slot(slot: &mut Value, segment: &PathSegment) {
    let fits = matches!(
        (&*slot, segment),
        (Value::Object(_), PathSegment::Field(_))
            | (Value::List(_), PathSegment::ListIndex(_))
            | (Value::Map(_), PathSegment::MapKey(_))
            | (Value::Set(_), PathSegment::SetItem(_))
            | (Value::Multi { .. }, PathSegment::TypeTag(_))
    );
    if fits {
        // A multi slot switches shape when the tag differs.
        if let (Value::Multi { tag, value }, PathSegment::TypeTag(t)) = (&mut *slot, segment) {
            if *tag != *t {
                *tag = *t;
                *value = Box::new(Value::Null);
            }
        }
        return;
    }
    *slot = match segment {
        PathSegment::Field(_) => Value::Object(ValueTree::new()),
        PathSegment::ListIndex(_) => Value::List(Vec::new()),
        PathSegment::MapKey(_) => Value::Map(BTreeMap::new()),
        PathSegment::SetItem(_) => Value::Set(BTreeSet::new()),
        PathSegment::TypeTag(t) => Value::Multi {
            tag: *t,
            value: Box::new(Value::Null),
        },
    };
}

/// Apply the final segment inside a coerced container slot.
fn apply_leaf(slot: &mut Value, segment: &PathSegment, value: Value) -> Result<()> {
    match (slot, segment) {
        (Value::Object(t), PathSegment::Field(tag)) => {
            t.set(*tag, value);
            Ok(())
        }
        (Value::List(items), PathSegment::ListIndex(index)) => {
            let index = *index as usize;
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            Ok(())
        }
        (Value::Map(entries), PathSegment::MapKey(key)) => {
            entries.insert(key.clone(), value);
            Ok(())
        }
        (Value::Set(members), PathSegment::SetItem(item)) => {
            // The inserted member is the segment itself.
            members.insert(item.clone());
            Ok(())
        }
        (Value::Multi { tag, value: inner }, PathSegment::TypeTag(t)) => {
            *tag = *t;
            *inner = Box::new(value);
            Ok(())
        }
        (slot, segment) => Err(TrellisError::InvalidCell(format!(
            "segment {segment:?} cannot land in {} value",
            slot.kind()
        ))),
    }
}
