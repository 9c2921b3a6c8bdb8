//! Qualifier Codec Module
//!
//! Translates property paths to and from sortable byte-string qualifiers.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────┬──────────────────┬─────────┬───────────────┐
//! │ Tag (1) │ Segment bytes …  │ Tag (1) │ Segment bytes │  (repeated)
//! └─────────┴──────────────────┴─────────┴───────────────┘
//! ```
//!
//! ### Segment bytes by property type
//! - Field:      1-byte storage tag (all siblings share the width)
//! - List:       4-byte unsigned big-endian insertion index
//! - Set:        the member's own scalar encoding
//! - Map:        the key's own scalar encoding, then the value's sub-path
//! - Multi:      1-byte stable type tag, then the variant's sub-path
//!
//! Numerics are fixed-width big-endian (top bit flipped for signed types),
//! so unsigned byte comparison reproduces numeric order. A reversed field
//! bitwise-inverts every byte of its own value/sub-path encoding — sibling
//! fields are untouched — so ascending byte order yields descending logical
//! order underneath it.
//!
//! ## Ordering Law
//! For any two distinct paths under one schema, path order and
//! lexicographic qualifier order agree (descending under reversed fields).
//! A path is an ancestor of another iff its qualifier is a byte prefix of
//! the other's.

mod decode;
mod encode;
mod scalar;

pub use decode::{decode_qualifier, DecodedQualifier, QualifierTarget};
pub use encode::encode_qualifier;
pub use scalar::{decode_scalar, encode_scalar, encode_scalar_segment, invert_bytes};

/// Append bytes, bitwise-inverting when inside a reversed field.
pub(crate) fn append_bytes(out: &mut Vec<u8>, bytes: &[u8], invert: bool) {
    if invert {
        out.extend(bytes.iter().map(|b| !b));
    } else {
        out.extend_from_slice(bytes);
    }
}

/// Append a single byte, honoring the inversion flag.
pub(crate) fn append_byte(out: &mut Vec<u8>, byte: u8, invert: bool) {
    out.push(if invert { !byte } else { byte });
}
