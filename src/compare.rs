//! Stable Comparison - Key-Order Independent Equality
//!
//! Unlike fingerprints, comparison keeps array order and does not round, so
//! two documents that differ only by sub-precision noise compare unequal.

use serde_json::Value;

use crate::canonical::sorted_map;
use crate::document::{DocumentError, PlacementDocument};

/// Sort mapping keys recursively; arrays keep their order and numbers are
/// left as they are.
pub fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => sorted_map(map, sort_value),
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        _ => value.clone(),
    }
}

/// Validate `input` as a placement document and render it with sorted keys.
///
/// Defaults are filled in first, so an omitted `mirrorX` equals an explicit `false`.
pub fn stable_placement_string(input: &Value) -> Result<String, DocumentError> {
    let document = PlacementDocument::from_value(input)?;
    stable_document_string(&document)
}

/// Same as `stable_placement_string` for an already typed document.
pub fn stable_document_string(document: &PlacementDocument) -> Result<String, DocumentError> {
    let value = serde_json::to_value(document)?;
    Ok(serde_json::to_string(&sort_value(&value))?)
}

pub fn are_placements_equal(left: &Value, right: &Value) -> Result<bool, DocumentError> {
    Ok(stable_placement_string(left)? == stable_placement_string(right)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vector_doc(offset_x: f64) -> Value {
        json!({
            "version": 2,
            "canvas": {"widthMm": 50, "heightMm": 50},
            "machine": {"strokeWidthWarningThresholdMm": 0.1},
            "objects": [{
                "id": "obj_1",
                "kind": "vector",
                "rotationDeg": 0,
                "anchor": "center",
                "offsetXMm": offset_x,
                "offsetYMm": 10,
                "boxWidthMm": 20,
                "boxHeightMm": 8,
                "mirrorX": false,
                "mirrorY": false,
                "zIndex": 1,
                "pathData": "M0 0 L1 0"
            }]
        })
    }

    #[test]
    fn test_sort_value_keeps_array_order() {
        let value = json!({"b": [3, 1, 2], "a": {"d": 1, "c": 2}});
        let sorted = serde_json::to_string(&sort_value(&value)).unwrap();
        assert_eq!(sorted, r#"{"a":{"c":2,"d":1},"b":[3,1,2]}"#);
    }

    #[test]
    fn test_defaults_compare_equal_to_explicit_values() {
        let mut sparse = vector_doc(10.0);
        let object = sparse["objects"][0].as_object_mut().unwrap();
        object.remove("mirrorX");
        object.remove("mirrorY");
        assert!(are_placements_equal(&sparse, &vector_doc(10.0)).unwrap());
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        let err = stable_placement_string(&json!({"version": 2})).unwrap_err();
        assert_eq!(err.code(), "INVALID_PLACEMENT");
    }

    #[test]
    fn test_noise_is_not_rounded_away() {
        assert!(!are_placements_equal(&vector_doc(10.0), &vector_doc(10.0001)).unwrap());
    }
}
