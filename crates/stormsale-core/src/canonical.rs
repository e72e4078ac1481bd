//! Canonical CBOR encoding for deterministic serialization.
//!
//! Any serde value can be encoded canonically (RFC 8949 Core Deterministic
//! Encoding):
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (amounts are integers in the smallest unit)
//!
//! The same payload always produces identical bytes, regardless of field
//! declaration order or hash-map iteration order.

use ciborium::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Encode a value to canonical CBOR bytes.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CoreError> {
    let value = Value::serialized(value).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value)?;
    Ok(buf)
}

/// Decode a value from CBOR bytes.
///
/// Trailing bytes after the first data item are rejected.
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    let mut reader = bytes;
    let value: T =
        ciborium::from_reader(&mut reader).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CoreError::DecodingError(format!(
            "{} trailing bytes",
            reader.len()
        )));
    }
    Ok(value)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer argument with the given major type.
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
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map with keys sorted by their encoded bytes.
///
/// Duplicate keys are rejected; they would make decoding ambiguous.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut pairs: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(CoreError::EncodingError("duplicate map key".into()));
    }

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sale {
        product: String,
        amount: u64,
    }

    #[derive(Serialize)]
    struct SaleReordered {
        amount: u64,
        product: String,
    }

    #[test]
    fn test_amount_vector() {
        let bytes = to_canonical_bytes(&serde_json::json!({ "amount": 100 })).unwrap();
        assert_eq!(hex::encode(bytes), "a166616d6f756e741864");
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let a = to_canonical_bytes(&Sale {
            product: "Digital Product".into(),
            amount: 5,
        })
        .unwrap();
        let b = to_canonical_bytes(&SaleReordered {
            amount: 5,
            product: "Digital Product".into(),
        })
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_map_is_deterministic() {
        let mut m1 = HashMap::new();
        let mut m2 = HashMap::new();
        for i in 0..32u32 {
            m1.insert(format!("k{i}"), i);
        }
        for i in (0..32u32).rev() {
            m2.insert(format!("k{i}"), i);
        }
        assert_eq!(to_canonical_bytes(&m1).unwrap(), to_canonical_bytes(&m2).unwrap());
    }

    #[test]
    fn test_roundtrip() {
        let sale = Sale {
            product: "Widget".into(),
            amount: 1_000_000,
        };
        let bytes = to_canonical_bytes(&sale).unwrap();
        let back: Sale = from_canonical_bytes(&bytes).unwrap();
        assert_eq!(sale, back);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = to_canonical_bytes(&7u8).unwrap();
        bytes.push(0x00);
        assert!(from_canonical_bytes::<u8>(&bytes).is_err());
    }

    #[test]
    fn test_floats_rejected() {
        assert!(to_canonical_bytes(&1.5f64).is_err());
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        encode_integer(&mut buf, (-1i64).into());
        assert_eq!(buf, vec![0x20]);
    }
}
