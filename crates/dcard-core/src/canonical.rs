//! # Canonical Serialization — JCS-Compatible Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in fingerprint computation.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()` (or `from_value()`), which
//! sorts object keys recursively and serializes the result as RFC 8785 JSON.
//! Any function that hashes card content must accept `&CanonicalBytes`, so a
//! digest over non-canonical bytes cannot be produced by accident.
//!
//! ## Cross-Language Compatibility
//!
//! Cards are also produced and consumed by JavaScript tooling that hashes
//! `JSON.stringify(canonicalize(card))`. The rules here match that output
//! for typical card content:
//!
//! 1. **Sort keys** — by UTF-16 code units, the order `Array.prototype.sort`
//!    and RFC 8785 both use.
//! 2. **Preserve array order** — arrays are recursed into, never reordered.
//! 3. **Compact separators** — no inserted whitespace.
//! 4. **ECMAScript numbers** — `serde_jcs` formats numbers the way
//!    `JSON.stringify` does (`1.0` → `1`, `1e21` → `1e+21`).
//!
//! Two cases differ from JavaScript:
//!
//! - Integer-like keys. JavaScript objects enumerate keys such as `"9"` and
//!   `"10"` first, in numeric order, whatever order they were inserted in.
//!   Here they sort as strings (`"10"` before `"9"`), as RFC 8785 requires.
//! - Integers beyond 2^53. JavaScript parses them into doubles and loses
//!   precision; `serde_json` keeps the exact digits.
//!
//! No other normalization is applied. Floats are accepted: card content is
//! application-defined and the number format is fixed by the serializer.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by recursive key sorting followed by
/// JCS serialization.
///
/// # Invariants
///
/// - The only constructors are `CanonicalBytes::new()` and
///   `CanonicalBytes::from_value()`.
/// - Object keys are sorted at every depth.
/// - Serialization uses compact separators and UTF-8 output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value cannot
    /// be represented as JSON (for example a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(&value)
    }

    /// Construct canonical bytes from an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, CanonicalizationError> {
        let sorted = canonicalize(value);
        let s = serde_jcs::to_string(&sorted)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as text. Always valid UTF-8.
    pub fn as_str(&self) -> &str {
        // JCS output is produced from a `String`, so this cannot fail.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively sort object keys, leaving scalars and array order untouched.
///
/// Pure and idempotent: `canonicalize(&canonicalize(v))` equals
/// `canonicalize(v)`, including key order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_utf16(a, b));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        scalar => scalar.clone(),
    }
}

/// Canonicalize and serialize a value in one step.
///
/// Convenience wrapper for callers that need the bytes rather than the
/// `CanonicalBytes` token.
pub fn canonical_serialize(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    CanonicalBytes::from_value(value).map(|cb| cb.0)
}

fn compare_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            (-1.0e6f64..1.0e6f64).prop_map(|f| serde_json::json!(f)),
            "[a-zA-Z0-9_ ]{0,30}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    /// Rebuild every object with its keys inserted in reverse order.
    fn reverse_key_order(value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(reverse_key_order).collect()),
            Value::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map.iter().rev() {
                    out.insert(k.clone(), reverse_key_order(v));
                }
                Value::Object(out)
            }
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn canonicalize_is_a_fixed_point(value in json_value()) {
            let once = canonicalize(&value);
            let twice = canonicalize(&once);
            // Compare serialized forms: `Map` equality ignores insertion order.
            prop_assert_eq!(
                serde_json::to_string(&once).unwrap(),
                serde_json::to_string(&twice).unwrap()
            );
        }

        #[test]
        fn key_order_does_not_change_bytes(value in json_value()) {
            let shuffled = reverse_key_order(&value);
            let a = CanonicalBytes::from_value(&value).unwrap();
            let b = CanonicalBytes::from_value(&shuffled).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn canonical_bytes_are_valid_json(value in json_value()) {
            let cb = CanonicalBytes::from_value(&value).unwrap();
            let parsed: Result<Value, _> = serde_json::from_slice(cb.as_bytes());
            prop_assert!(parsed.is_ok(), "not valid JSON: {:?}", parsed.err());
        }

        #[test]
        fn canonical_bytes_contain_no_whitespace_outside_strings(
            keys in prop::collection::btree_set("[a-z]{1,8}", 1..6)
        ) {
            let map: Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), serde_json::json!([i, {"n": i}])))
                .collect();
            let cb = CanonicalBytes::from_value(&Value::Object(map)).unwrap();
            prop_assert!(!cb.as_bytes().iter().any(|b| b.is_ascii_whitespace()));
        }
    }
}
