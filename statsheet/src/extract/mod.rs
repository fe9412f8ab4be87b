//! Dotted-path access into nested provider responses.
//!
//! Responses are plain [`serde_json::Value`] trees. A path such as
//! `response.body.items.item` walks object keys; an all-digit segment
//! indexes into an array (`items.0.name`). Resolution never fails: any
//! step that cannot be taken yields `null`.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Resolve a dotted `path` against `doc`.
///
/// - empty path: the document itself
/// - object: key lookup (absent key -> `null`)
/// - array: base-10 index (non-numeric or out of range -> `null`)
/// - scalar or `null` with segments left: `null`
///
/// A stored `null` and a missing key are indistinguishable.
pub fn resolve<'a>(doc: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return doc;
    }

    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment).unwrap_or(&NULL),
            Value::Array(items) => match parse_index(segment) {
                Some(idx) => items.get(idx).unwrap_or(&NULL),
                None => return &NULL,
            },
            _ => return &NULL,
        };
    }
    current
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Too large to be an index at all: treat as out of range
    Some(segment.parse().unwrap_or(usize::MAX))
}

/// Coerce a resolved value into a list of items.
///
/// `null` -> `[]`, array -> its elements, anything else -> `[value]`.
/// Providers that return a single item unwrapped then look the same as
/// those returning many.
pub fn normalize_to_list(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// [`resolve`] then [`normalize_to_list`], cloning out of `doc`.
pub fn extract_items(doc: &Value, path: &str) -> Vec<Value> {
    normalize_to_list(resolve(doc, path).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope() -> Value {
        json!({"response": {"body": {"items": {"item": [{"a": 1}]}}}})
    }

    #[test]
    fn test_resolve_nested_index() {
        let doc = envelope();
        assert_eq!(resolve(&doc, "response.body.items.item.0.a"), &json!(1));
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let doc = envelope();
        assert_eq!(resolve(&doc, "response.body.items.item.5.a"), &Value::Null);
    }

    #[test]
    fn test_resolve_empty_path_returns_document() {
        let doc = envelope();
        assert_eq!(resolve(&doc, ""), &doc);
    }

    #[test]
    fn test_resolve_missing_key() {
        let doc = envelope();
        assert_eq!(resolve(&doc, "response.header.resultCode"), &Value::Null);
    }

    #[test]
    fn test_resolve_non_numeric_segment_on_array() {
        let doc = envelope();
        assert_eq!(resolve(&doc, "response.body.items.item.a"), &Value::Null);
        assert_eq!(resolve(&doc, "response.body.items.item.-1"), &Value::Null);
        assert_eq!(resolve(&doc, "response.body.items.item.+0"), &Value::Null);
    }

    #[test]
    fn test_resolve_through_scalar_and_null() {
        let doc = json!({"a": {"b": 3, "n": null}});
        assert_eq!(resolve(&doc, "a.b.c"), &Value::Null);
        assert_eq!(resolve(&doc, "a.n.deeper.still"), &Value::Null);
        assert_eq!(resolve(&doc, "a.n"), &Value::Null);
        assert_eq!(resolve(&json!("scalar"), "x"), &Value::Null);
    }

    #[test]
    fn test_resolve_huge_index() {
        let doc = json!([1, 2]);
        assert_eq!(resolve(&doc, "99999999999999999999999"), &Value::Null);
        assert_eq!(resolve(&doc, "1"), &json!(2));
    }

    #[test]
    fn test_resolve_odd_segments() {
        let doc = json!({"": {"x": 1}, "a.b": 2});
        // Empty segments are ordinary (empty) keys
        assert_eq!(resolve(&doc, ".x"), &json!(1));
        // Keys containing dots cannot be addressed
        assert_eq!(resolve(&doc, "a.b"), &Value::Null);
    }

    #[test]
    fn test_normalize_to_list() {
        assert!(normalize_to_list(Value::Null).is_empty());
        assert_eq!(normalize_to_list(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(normalize_to_list(json!({"a": 1})), vec![json!({"a": 1})]);
        assert_eq!(normalize_to_list(json!("x")), vec![json!("x")]);
    }

    #[test]
    fn test_extract_single_item_unwrapped() {
        let doc = json!({"response": {"body": {"items": {"item": {"a": 1}}}}});
        let items = extract_items(&doc, "response.body.items.item");
        assert_eq!(items, vec![json!({"a": 1})]);
    }
}
