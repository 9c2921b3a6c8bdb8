//! Qualifier encoding
//!
//! Walks a property path alongside the schema, appending each segment's
//! sortable byte encoding. Inversion for reversed fields accumulates down
//! the path: a reversed field inside a reversed field encodes ascending
//! again.

use crate::error::{Result, TrellisError};
use crate::path::{PathSegment, PropertyPath};
use crate::qualifier::scalar::encode_scalar_segment;
use crate::qualifier::{append_byte, append_bytes};
use crate::schema::{ModelSchema, PropertyType, SchemaRegistry};

/// Schema position while walking a path.
#[derive(Clone, Copy)]
enum Cursor<'a> {
    /// Inside an object: the next segment must be a field tag.
    Model(&'a ModelSchema),

    /// At a typed property: the next segment descends into it.
    Ty(&'a PropertyType),

    /// A set member was consumed; nothing may follow.
    Terminal,
}

/// Encode a property path into its sortable byte qualifier.
///
/// Mutual inverse of [`super::decode_qualifier`] for every valid path under
/// the given schema. The record root encodes to the empty byte string.
pub fn encode_qualifier(
    path: &PropertyPath,
    model: &ModelSchema,
    registry: &SchemaRegistry,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(path.len() * 2);
    let mut invert = false;
    let mut cursor = Cursor::Model(model);

    for segment in path.segments() {
        // Resolve model indirection lazily, by name.
        if let Cursor::Ty(PropertyType::Model(name)) = cursor {
            cursor = Cursor::Model(registry.get(name)?);
        }

        cursor = match (cursor, segment) {
            (Cursor::Model(m), PathSegment::Field(tag)) => {
                let field = m
                    .field_by_tag(*tag)
                    .ok_or(TrellisError::UnknownFieldTag { tag: *tag })?;
                append_byte(&mut out, *tag, invert);
                invert ^= field.reversed;
                Cursor::Ty(&field.ty)
            }
            (Cursor::Ty(PropertyType::List(elem)), PathSegment::ListIndex(index)) => {
                append_bytes(&mut out, &index.to_be_bytes(), invert);
                Cursor::Ty(elem)
            }
            (Cursor::Ty(PropertyType::Set(item_ty)), PathSegment::SetItem(item)) => {
                let bytes = encode_scalar_segment(item, item_ty)?;
                append_bytes(&mut out, &bytes, invert);
                Cursor::Terminal
            }
            (Cursor::Ty(PropertyType::Map { key, value }), PathSegment::MapKey(k)) => {
                let bytes = encode_scalar_segment(k, key)?;
                append_bytes(&mut out, &bytes, invert);
                Cursor::Ty(value)
            }
            (Cursor::Ty(PropertyType::Multi(variants)), PathSegment::TypeTag(tag)) => {
                let variant = variants.get(*tag as usize).ok_or_else(|| {
                    TrellisError::Schema(format!(
                        "type tag {tag} out of range ({} variants)",
                        variants.len()
                    ))
                })?;
                append_byte(&mut out, *tag, invert);
                Cursor::Ty(variant)
            }
            (_, segment) => {
                return Err(TrellisError::Schema(format!(
                    "segment {segment:?} does not fit the schema at this position"
                )));
            }
        };
    }

    Ok(out)
}
