//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (prices travel as fixed-width byte strings)
//!
//! Every honest node must produce byte-identical reports from the same
//! outcome, so nothing here may depend on platform or insertion order.

use ciborium::value::{Integer, Value};

use crate::error::CoreError;
use crate::types::Bytes32;

/// Encode a CBOR value to canonical bytes.
pub fn encode_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Parse a single CBOR item, rejecting trailing bytes.
pub fn decode_value(bytes: &[u8]) -> Result<Value, CoreError> {
    let mut cursor = std::io::Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(&mut cursor).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    if cursor.position() as usize != bytes.len() {
        return Err(CoreError::DecodingError("trailing bytes".into()));
    }
    Ok(value)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => return Err(CoreError::EncodingError("unsupported CBOR value type".into())),
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        key_value_pairs.push((key_buf, v));
    }

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

// Decoding helpers shared by the report codec.

/// Look up an integer key in a decoded map.
pub(crate) fn map_get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
        .map(|(_, v)| v)
}

pub(crate) fn as_u64(value: &Value, what: &str) -> Result<u64, CoreError> {
    match value {
        Value::Integer(i) => {
            u64::try_from(*i).map_err(|_| CoreError::MalformedReport(format!("{what} out of range")))
        }
        _ => Err(CoreError::MalformedReport(format!("{what}: expected integer"))),
    }
}

pub(crate) fn as_bytes32(value: &Value, what: &str) -> Result<Bytes32, CoreError> {
    match value {
        Value::Bytes(b) => Bytes32::try_from(b.as_slice())
            .map_err(|_| CoreError::MalformedReport(format!("{what}: expected 32 bytes"))),
        _ => Err(CoreError::MalformedReport(format!("{what}: expected bytes"))),
    }
}

pub(crate) fn as_u128(value: &Value, what: &str) -> Result<u128, CoreError> {
    match value {
        Value::Bytes(b) => {
            let arr: [u8; 16] = b
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::MalformedReport(format!("{what}: expected 16 bytes")))?;
            Ok(u128::from_be_bytes(arr))
        }
        _ => Err(CoreError::MalformedReport(format!("{what}: expected bytes"))),
    }
}

pub(crate) fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a [Value], CoreError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(CoreError::MalformedReport(format!("{what}: expected array"))),
    }
}
