//! Schema Module
//!
//! Contracts supplied by the schema provider: property types with storage
//! widths, field definitions with fixed storage tags and sort direction,
//! model schemas, the model registry (lazy by-name resolution for
//! self-referential models), and indexable key definitions for scan
//! planning.
//!
//! ## Responsibilities
//! - Map field storage tags to typed property definitions
//! - Carry byte widths so qualifier encodings stay fixed-width and sortable
//! - Describe composite / reversed index keys for the scan planner

mod indexable;
mod registry;

pub use indexable::{IndexPart, Indexable};
pub use registry::SchemaRegistry;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrellisError};

/// Scalar storage types with their byte encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    /// Fixed-width big-endian integer. Signed numbers flip the top bit so
    /// unsigned byte comparison matches numeric order.
    Number { width: u8, signed: bool },

    /// 8-byte unsigned big-endian milli-instant.
    Time,

    /// Raw UTF-8 bytes (variable length).
    Text,

    /// Opaque bytes (variable length).
    Blob,

    /// Single byte, 0 or 1.
    Bool,
}

impl ScalarType {
    /// Unsigned 4-byte number, the common index key type.
    pub const U32: ScalarType = ScalarType::Number {
        width: 4,
        signed: false,
    };

    /// Signed 8-byte number.
    pub const I64: ScalarType = ScalarType::Number {
        width: 8,
        signed: true,
    };

    /// Encoded byte width, `None` for variable-length types.
    pub fn width(&self) -> Option<usize> {
        match self {
            ScalarType::Number { width, .. } => Some(*width as usize),
            ScalarType::Time => Some(8),
            ScalarType::Bool => Some(1),
            ScalarType::Text | ScalarType::Blob => None,
        }
    }
}

/// A property's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    /// Terminal scalar.
    Scalar(ScalarType),

    /// Ordered list of elements.
    List(Box<PropertyType>),

    /// Set of scalar members (the member bytes live in the qualifier).
    Set(ScalarType),

    /// Map with scalar keys. Variable-length (text) keys are only legal when
    /// the value is a scalar, so the qualifier stays self-delimiting.
    Map {
        key: ScalarType,
        value: Box<PropertyType>,
    },

    /// Multi-typed slot; the variant position is the stable type tag.
    Multi(Vec<PropertyType>),

    /// Embedded model, resolved lazily by name through the registry so
    /// self-referential schemas do not recurse at definition time.
    Model(String),
}

/// One field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Fixed storage tag (1..=255); decides sibling order on the wire.
    pub tag: u8,

    /// Declaration name, used in error messages only.
    pub name: String,

    /// Declared type.
    pub ty: PropertyType,

    /// Reversed sort direction: every byte of this field's own value and
    /// sub-path encoding is bitwise-inverted, so ascending byte order yields
    /// descending logical order.
    pub reversed: bool,
}

impl FieldDef {
    /// Plain ascending field.
    pub fn new(tag: u8, name: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            tag,
            name: name.into(),
            ty,
            reversed: false,
        }
    }

    /// Mark the field as descending on the wire.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

/// A model: named, with fields ordered by storage tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl ModelSchema {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field; keeps the field list sorted by tag.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self.fields.sort_by_key(|f| f.tag);
        self
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in ascending tag order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by storage tag.
    pub fn field_by_tag(&self, tag: u8) -> Option<&FieldDef> {
        self.fields
            .binary_search_by_key(&tag, |f| f.tag)
            .ok()
            .map(|i| &self.fields[i])
    }

    /// Validate the definition: tags unique and non-zero, variable-length
    /// map keys only at terminal qualifiers, reversal only over fixed-width
    /// qualifier segments.
    pub fn validate(&self) -> Result<()> {
        for window in self.fields.windows(2) {
            if window[0].tag == window[1].tag {
                return Err(TrellisError::Schema(format!(
                    "model '{}': duplicate field tag 0x{:02x}",
                    self.name, window[0].tag
                )));
            }
        }
        for field in &self.fields {
            if field.tag == 0 {
                return Err(TrellisError::Schema(format!(
                    "model '{}': field '{}' uses reserved tag 0",
                    self.name, field.name
                )));
            }
            validate_type(&self.name, &field.name, &field.ty)?;
            if field.reversed {
                validate_reversed(&self.name, &field.name, &field.ty)?;
            }
        }
        Ok(())
    }
}

fn validate_type(model: &str, field: &str, ty: &PropertyType) -> Result<()> {
    // Iterative walk; schemas can nest arbitrarily deep.
    let mut pending = vec![ty];
    while let Some(ty) = pending.pop() {
        match ty {
            PropertyType::Scalar(_) | PropertyType::Model(_) => {}
            PropertyType::List(elem) => pending.push(elem),
            PropertyType::Set(_) => {}
            PropertyType::Map { key, value } => {
                if key.width().is_none() && !matches!(**value, PropertyType::Scalar(_)) {
                    return Err(TrellisError::Schema(format!(
                        "model '{model}': field '{field}' maps variable-length keys \
                         to non-scalar values; the qualifier would not be self-delimiting"
                    )));
                }
                pending.push(value);
            }
            PropertyType::Multi(variants) => {
                if variants.len() > u8::MAX as usize {
                    return Err(TrellisError::Schema(format!(
                        "model '{model}': field '{field}' has more than 255 type variants"
                    )));
                }
                pending.extend(variants.iter());
            }
        }
    }
    Ok(())
}

/// Byte inversion only preserves order for fixed-width segments: inverted
/// variable-length keys still sort shortest-first, so a reversed field may
/// not put text/blob map keys or set items in its qualifiers.
fn validate_reversed(model: &str, field: &str, ty: &PropertyType) -> Result<()> {
    let mut pending = vec![ty];
    while let Some(ty) = pending.pop() {
        match ty {
            PropertyType::Scalar(_) | PropertyType::Model(_) => {}
            PropertyType::List(elem) => pending.push(elem),
            PropertyType::Set(item_ty) => {
                if item_ty.width().is_none() {
                    return Err(TrellisError::Schema(format!(
                        "model '{model}': reversed field '{field}' holds \
                         variable-length set items; inversion cannot reverse their order"
                    )));
                }
            }
            PropertyType::Map { key, value } => {
                if key.width().is_none() {
                    return Err(TrellisError::Schema(format!(
                        "model '{model}': reversed field '{field}' holds \
                         variable-length map keys; inversion cannot reverse their order"
                    )));
                }
                pending.push(value);
            }
            PropertyType::Multi(variants) => pending.extend(variants.iter()),
        }
    }
    Ok(())
}
