//! Scalar byte encodings
//!
//! Fixed-width, order-preserving encodings for the scalar types that appear
//! in qualifiers (map keys, set items, index parts) and in cell payloads.

use crate::error::{Result, TrellisError};
use crate::schema::ScalarType;
use crate::value::Value;

/// Bitwise-invert a byte string in place (reversed-direction encoding).
pub fn invert_bytes(bytes: &mut [u8]) {
    for b in bytes.iter_mut() {
        *b = !*b;
    }
}

/// Encode a scalar value at its declared type.
///
/// Numerics are big-endian at the declared width; signed numbers flip the
/// top bit so unsigned byte comparison matches numeric order.
pub fn encode_scalar(value: &Value, ty: &ScalarType) -> Result<Vec<u8>> {
    match (ty, value) {
        (ScalarType::Number { width, signed }, Value::Number(n)) => {
            encode_number(*n, *width, *signed)
        }
        (ScalarType::Time, Value::Time(t)) => Ok(t.to_be_bytes().to_vec()),
        (ScalarType::Text, Value::Text(s)) => Ok(s.as_bytes().to_vec()),
        (ScalarType::Blob, Value::Blob(b)) => Ok(b.clone()),
        (ScalarType::Bool, Value::Bool(b)) => Ok(vec![u8::from(*b)]),
        (ty, value) => Err(TrellisError::TypeMismatch(format!(
            "cannot encode {} value as {:?}",
            value.kind(),
            ty
        ))),
    }
}

/// Encode a scalar that names a qualifier segment (map key, set item).
///
/// Variable-length values must encode to at least one byte: a zero-byte
/// segment would make the entry's qualifier collide with its container's.
pub fn encode_scalar_segment(value: &Value, ty: &ScalarType) -> Result<Vec<u8>> {
    let bytes = encode_scalar(value, ty)?;
    if bytes.is_empty() {
        return Err(TrellisError::TypeMismatch(format!(
            "empty {} value cannot name a qualifier segment",
            value.kind()
        )));
    }
    Ok(bytes)
}

/// Decode a scalar value from its exact byte span.
pub fn decode_scalar(bytes: &[u8], ty: &ScalarType) -> Result<Value> {
    if let Some(width) = ty.width() {
        if bytes.len() != width {
            return Err(TrellisError::TypeMismatch(format!(
                "expected {width} bytes for {ty:?}, got {}",
                bytes.len()
            )));
        }
    }
    match ty {
        ScalarType::Number { width, signed } => decode_number(bytes, *width, *signed),
        ScalarType::Time => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Ok(Value::Time(u64::from_be_bytes(buf)))
        }
        ScalarType::Text => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Value::Text(s.to_string())),
            Err(e) => Err(TrellisError::TypeMismatch(format!(
                "text value is not valid UTF-8: {e}"
            ))),
        },
        ScalarType::Blob => Ok(Value::Blob(bytes.to_vec())),
        ScalarType::Bool => match bytes[0] {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(TrellisError::TypeMismatch(format!(
                "bool byte must be 0 or 1, got {other}"
            ))),
        },
    }
}

fn encode_number(n: i64, width: u8, signed: bool) -> Result<Vec<u8>> {
    let bits = u32::from(width) * 8;
    if !(1..=8).contains(&width) {
        return Err(TrellisError::TypeMismatch(format!(
            "unsupported number width {width}"
        )));
    }

    // Domain check at the declared width.
    if signed {
        let min = if width == 8 { i64::MIN } else { -(1i64 << (bits - 1)) };
        let max = if width == 8 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };
        if n < min || n > max {
            return Err(TrellisError::TypeMismatch(format!(
                "{n} out of range for signed {width}-byte number"
            )));
        }
    } else {
        let max = if width == 8 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        if n < 0 || (n as u64) > max {
            return Err(TrellisError::TypeMismatch(format!(
                "{n} out of range for unsigned {width}-byte number"
            )));
        }
    }

    let mask = if width == 8 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    let mut unsigned = (n as u64) & mask;
    if signed {
        // Flip the sign bit: negative values sort below positives.
        unsigned ^= 1u64 << (bits - 1);
    }

    let be = unsigned.to_be_bytes();
    Ok(be[8 - width as usize..].to_vec())
}

fn decode_number(bytes: &[u8], width: u8, signed: bool) -> Result<Value> {
    let bits = u32::from(width) * 8;
    let mut buf = [0u8; 8];
    buf[8 - width as usize..].copy_from_slice(bytes);
    let mut unsigned = u64::from_be_bytes(buf);

    if signed {
        unsigned ^= 1u64 << (bits - 1);
        // Sign-extend from the declared width.
        let sign_bit = 1u64 << (bits - 1);
        let value = if width < 8 && unsigned & sign_bit != 0 {
            (unsigned | !((1u64 << bits) - 1)) as i64
        } else {
            unsigned as i64
        };
        Ok(Value::Number(value))
    } else {
        if unsigned > i64::MAX as u64 {
            return Err(TrellisError::TypeMismatch(format!(
                "unsigned value {unsigned} exceeds the number domain"
            )));
        }
        Ok(Value::Number(unsigned as i64))
    }
}
