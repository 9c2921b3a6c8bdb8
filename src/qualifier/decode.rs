//! Qualifier decoding
//!
//! Rebuilds a property path from qualifier bytes under a schema. Decoding
//! fails with `MalformedQualifier` when bytes run out mid-segment, but an
//! unrecognized field tag (schema evolution: a newer writer knew fields this
//! schema does not) yields [`DecodedQualifier::Unknown`] so streaming
//! readers can skip the cell instead of aborting the scan.

use crate::error::{Result, TrellisError};
use crate::path::{PathSegment, PropertyPath};
use crate::qualifier::scalar::decode_scalar;
use crate::schema::{ModelSchema, PropertyType, ScalarType, SchemaRegistry};

/// What a decoded qualifier points at. Readers use this to classify the cell
/// without re-resolving the path against the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierTarget {
    /// The record root (empty qualifier); its cell is the record marker.
    Record,

    /// A scalar leaf; the cell payload decodes at this type.
    Scalar { ty: ScalarType },

    /// A list's own qualifier; the cell payload is the item count.
    ListContainer,

    /// A set's own qualifier; the cell payload is the member count.
    SetContainer { ty: ScalarType },

    /// A map's own qualifier; the cell payload is the entry count.
    MapContainer,

    /// A multi-typed slot's own qualifier; the cell payload is the type tag.
    MultiContainer,

    /// An embedded object's own qualifier (embed marker cell).
    ObjectContainer,

    /// A set member: the member value lives in the qualifier itself and the
    /// cell payload is a bare presence marker.
    SetMember { ty: ScalarType },
}

/// Decode outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedQualifier {
    /// A path this schema understands.
    Path {
        path: PropertyPath,
        target: QualifierTarget,
    },

    /// The qualifier carries a field or type tag this schema does not know.
    /// `prefix` is the part that did decode; the remainder was skipped.
    Unknown { prefix: PropertyPath },
}

enum Cursor<'a> {
    Model(&'a ModelSchema),
    Ty(&'a PropertyType),
    SetMember(ScalarType),
}

/// Decode qualifier bytes into a property path.
pub fn decode_qualifier(
    bytes: &[u8],
    model: &ModelSchema,
    registry: &SchemaRegistry,
) -> Result<DecodedQualifier> {
    let mut segments: Vec<PathSegment> = Vec::new();
    let mut pos = 0usize;
    let mut invert = false;
    let mut cursor = Cursor::Model(model);

    // Read helpers honoring the accumulated inversion flag.
    let read = |pos: usize, invert: bool| -> u8 {
        let b = bytes[pos];
        if invert {
            !b
        } else {
            b
        }
    };
    let read_span = |range: std::ops::Range<usize>, invert: bool| -> Vec<u8> {
        bytes[range]
            .iter()
            .map(|b| if invert { !b } else { *b })
            .collect()
    };

    while pos < bytes.len() {
        cursor = match cursor {
            Cursor::Model(m) => {
                let tag = read(pos, invert);
                pos += 1;
                match m.field_by_tag(tag) {
                    None => {
                        return Ok(DecodedQualifier::Unknown {
                            prefix: PropertyPath::from_segments(segments),
                        });
                    }
                    Some(field) => {
                        segments.push(PathSegment::Field(tag));
                        invert ^= field.reversed;
                        Cursor::Ty(&field.ty)
                    }
                }
            }
            Cursor::Ty(ty) => match ty {
                PropertyType::Model(name) => Cursor::Model(registry.get(name)?),
                PropertyType::Scalar(_) => {
                    return Err(TrellisError::MalformedQualifier(format!(
                        "{} trailing bytes after a scalar leaf",
                        bytes.len() - pos
                    )));
                }
                PropertyType::List(elem) => {
                    if bytes.len() - pos < 4 {
                        return Err(TrellisError::MalformedQualifier(
                            "truncated list index".to_string(),
                        ));
                    }
                    let raw = read_span(pos..pos + 4, invert);
                    let index = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
                    pos += 4;
                    segments.push(PathSegment::ListIndex(index));
                    Cursor::Ty(elem)
                }
                PropertyType::Set(item_ty) => {
                    let span = match item_ty.width() {
                        Some(w) => {
                            if bytes.len() - pos < w {
                                return Err(TrellisError::MalformedQualifier(
                                    "truncated set member".to_string(),
                                ));
                            }
                            pos..pos + w
                        }
                        None => pos..bytes.len(),
                    };
                    let raw = read_span(span.clone(), invert);
                    pos = span.end;
                    let item = decode_scalar(&raw, item_ty).map_err(|e| {
                        TrellisError::MalformedQualifier(format!("bad set member: {e}"))
                    })?;
                    segments.push(PathSegment::SetItem(item));
                    Cursor::SetMember(*item_ty)
                }
                PropertyType::Map { key, value } => {
                    let span = match key.width() {
                        Some(w) => {
                            if bytes.len() - pos < w {
                                return Err(TrellisError::MalformedQualifier(
                                    "truncated map key".to_string(),
                                ));
                            }
                            pos..pos + w
                        }
                        // Variable-length keys are terminal by schema rule.
                        None => pos..bytes.len(),
                    };
                    let raw = read_span(span.clone(), invert);
                    pos = span.end;
                    let k = decode_scalar(&raw, key).map_err(|e| {
                        TrellisError::MalformedQualifier(format!("bad map key: {e}"))
                    })?;
                    segments.push(PathSegment::MapKey(k));
                    Cursor::Ty(value)
                }
                PropertyType::Multi(variants) => {
                    let tag = read(pos, invert);
                    pos += 1;
                    match variants.get(tag as usize) {
                        None => {
                            return Ok(DecodedQualifier::Unknown {
                                prefix: PropertyPath::from_segments(segments),
                            });
                        }
                        Some(variant) => {
                            segments.push(PathSegment::TypeTag(tag));
                            Cursor::Ty(variant)
                        }
                    }
                }
            },
            Cursor::SetMember(_) => {
                return Err(TrellisError::MalformedQualifier(
                    "bytes after a set member".to_string(),
                ));
            }
        };
    }

    // Model indirection may be the final cursor state when the qualifier
    // ends exactly at an embedded-object boundary.
    let target = match cursor {
        Cursor::Model(_) => {
            if segments.is_empty() {
                QualifierTarget::Record
            } else {
                QualifierTarget::ObjectContainer
            }
        }
        Cursor::Ty(ty) => match ty {
            PropertyType::Scalar(st) => QualifierTarget::Scalar { ty: *st },
            PropertyType::List(_) => QualifierTarget::ListContainer,
            PropertyType::Set(st) => QualifierTarget::SetContainer { ty: *st },
            PropertyType::Map { .. } => QualifierTarget::MapContainer,
            PropertyType::Multi(_) => QualifierTarget::MultiContainer,
            PropertyType::Model(_) => QualifierTarget::ObjectContainer,
        },
        Cursor::SetMember(st) => QualifierTarget::SetMember { ty: st },
    };

    Ok(DecodedQualifier::Path {
        path: PropertyPath::from_segments(segments),
        target,
    })
}
