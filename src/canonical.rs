//! Canonical Serializer - SHA-256 Fingerprints for Placements
//!
//! Produces a text form that is stable under key reordering, reordering of
//! z-ordered object arrays, and numeric noise below the rounding precision.

use sha2::{Digest, Sha256};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use thiserror::Error;

pub const DEFAULT_PRECISION_MM: f64 = 0.001;
pub const SCHEMA_VERSION: &str = "v2";
pub const HARDENED_AT: &str = "layer-2.2";

/// Largest magnitude at which every integer is exactly representable in an f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("Rounding precision must be a finite positive number, got {0}")]
    InvalidPrecision(f64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CanonicalError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPrecision(_) => "INVALID_PRECISION",
            Self::Serialization(_) => "SERIALIZATION_FAILED",
        }
    }
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Rebuild a mapping with its keys in ascending order, mapping each value through `f`.
pub(crate) fn sorted_map(map: &Map<String, Value>, f: impl Fn(&Value) -> Value) -> Value {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), f(v))).collect())
}

/// Normalize a JSON value: round numbers, sort keys, and order arrays of
/// `zIndex`/`id` mappings by `zIndex` then `id`.
pub fn canonicalize(value: &Value, precision: f64) -> Value {
    match value {
        Value::Number(n) => round_number(n, precision),
        Value::Array(items) => {
            let mut normalized: Vec<Value> = items
                .iter()
                .map(|item| canonicalize(item, precision))
                .collect();
            if normalized.iter().all(is_sortable_entry) {
                normalized.sort_by(compare_entries);
            }
            Value::Array(normalized)
        }
        Value::Object(map) => sorted_map(map, |v| canonicalize(v, precision)),
        _ => value.clone(),
    }
}

fn is_sortable_entry(value: &Value) -> bool {
    value
        .as_object()
        .map_or(false, |map| map.contains_key("zIndex") || map.contains_key("id"))
}

/// Numeric strings count as their value; anything else non-numeric counts as 0.
fn z_index_of(entry: &Value) -> f64 {
    let z = match entry.get("zIndex") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    z.filter(|z| z.is_finite()).unwrap_or(0.0)
}

fn compare_entries(a: &Value, b: &Value) -> Ordering {
    let z = z_index_of;
    let id = |v: &Value| match v.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    z(a).total_cmp(&z(b)).then_with(|| id(a).cmp(&id(b)))
}

/// Round to the nearest multiple of `precision`. Integral results become JSON
/// integers so `3` and `3.0` (and `-0.0`) canonicalize alike.
fn round_number(n: &Number, precision: f64) -> Value {
    let Some(raw) = n.as_f64() else {
        return Value::Number(n.clone());
    };
    let factor = 1.0 / precision;
    let rounded = (raw * factor).round() / factor;

    if rounded.fract() == 0.0 && rounded.abs() <= MAX_SAFE_INTEGER {
        return Value::Number(Number::from(rounded as i64));
    }
    Number::from_f64(rounded)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn check_precision(precision: f64) -> Result<(), CanonicalError> {
    if precision.is_finite() && precision > 0.0 {
        Ok(())
    } else {
        Err(CanonicalError::InvalidPrecision(precision))
    }
}

/// Canonical text of a document wrapped in the schema envelope.
pub fn canonical_serialize<T: Serialize>(document: &T, precision: f64) -> Result<String, CanonicalError> {
    check_precision(precision)?;
    let v: Value = serde_json::to_value(document)?;
    let normalized = canonicalize(&v, precision);

    let mut metadata = Map::new();
    metadata.insert("hardenedAt".to_string(), Value::String(HARDENED_AT.to_string()));

    let mut envelope = Map::new();
    envelope.insert("document".to_string(), normalized);
    envelope.insert("migrationMetadata".to_string(), Value::Object(metadata));
    envelope.insert("schemaVersion".to_string(), Value::String(SCHEMA_VERSION.to_string()));

    Ok(serde_json::to_string(&Value::Object(envelope))?)
}

/// SHA-256 of the canonical text, lowercase hex.
pub fn fingerprint<T: Serialize>(document: &T, precision: f64) -> Result<String, CanonicalError> {
    let canonical = canonical_serialize(document, precision)?;
    let hash = sha256_hex(canonical.as_bytes());
    log::debug!("fingerprint {} ({} canonical bytes)", hash, canonical.len());
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_sorts_keys_and_objects() {
        let doc_a = json!({
            "objects": [{"id": "b", "zIndex": 2}, {"zIndex": 1, "id": "a"}],
            "zone": {"heightMm": 10.0004, "widthMm": 20}
        });
        let doc_b = json!({
            "zone": {"widthMm": 20, "heightMm": 10.00049},
            "objects": [{"id": "a", "zIndex": 1}, {"id": "b", "zIndex": 2}]
        });

        let a = canonical_serialize(&doc_a, DEFAULT_PRECISION_MM).unwrap();
        let b = canonical_serialize(&doc_b, DEFAULT_PRECISION_MM).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            fingerprint(&doc_a, DEFAULT_PRECISION_MM).unwrap(),
            fingerprint(&doc_b, DEFAULT_PRECISION_MM).unwrap()
        );
    }

    #[test]
    fn test_envelope_shape() {
        let canonical = canonical_serialize(&json!({"b": 1.5, "a": 2}), DEFAULT_PRECISION_MM).unwrap();
        assert_eq!(
            canonical,
            r#"{"document":{"a":2,"b":1.5},"migrationMetadata":{"hardenedAt":"layer-2.2"},"schemaVersion":"v2"}"#
        );
    }

    #[test]
    fn test_mixed_arrays_keep_order() {
        let value = json!([{"id": "b"}, 3, {"id": "a"}]);
        let canonical = canonicalize(&value, DEFAULT_PRECISION_MM);
        assert_eq!(canonical, json!([{"id": "b"}, 3, {"id": "a"}]));

        let plain = json!([{"name": "b"}, {"name": "a"}]);
        assert_eq!(canonicalize(&plain, DEFAULT_PRECISION_MM), plain);
    }

    #[test]
    fn test_missing_z_index_defaults_to_zero() {
        let value = json!([{"id": "z", "zIndex": 1}, {"id": "y"}, {"zIndex": -1}]);
        let canonical = canonicalize(&value, DEFAULT_PRECISION_MM);
        assert_eq!(canonical, json!([{"zIndex": -1}, {"id": "y"}, {"id": "z", "zIndex": 1}]));
    }

    #[test]
    fn test_integral_floats_match_integers() {
        assert_eq!(canonicalize(&json!(3.0), DEFAULT_PRECISION_MM), json!(3));
        assert_eq!(canonicalize(&json!(-0.0001), DEFAULT_PRECISION_MM), json!(0));
        assert_eq!(canonicalize(&json!(1.23456), DEFAULT_PRECISION_MM), json!(1.235));
    }

    #[test]
    fn test_coarser_precision() {
        assert_eq!(canonicalize(&json!(12.4), 0.5), json!(12.5));
        assert_eq!(canonicalize(&json!(12.2), 0.5), json!(12));
    }

    #[test]
    fn test_rejects_bad_precision() {
        let err = canonical_serialize(&json!({}), 0.0).unwrap_err();
        assert_eq!(err.code(), "INVALID_PRECISION");
        assert!(fingerprint(&json!({}), f64::NAN).is_err());
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hash = fingerprint(&json!({"a": 1}), DEFAULT_PRECISION_MM).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_numeric_string_z_index_sorts_by_value() {
        let value = json!([{"id": "a", "zIndex": "2"}, {"id": "b", "zIndex": 1}, {"id": "c", "zIndex": "top"}]);
        let canonical = canonicalize(&value, DEFAULT_PRECISION_MM);
        assert_eq!(
            canonical,
            json!([{"id": "c", "zIndex": "top"}, {"id": "b", "zIndex": 1}, {"id": "a", "zIndex": "2"}])
        );
    }
}
