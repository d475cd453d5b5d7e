//! Small helpers over `serde_json` maps
//!
//! Filter documents are open-ended JSON objects, so most passes work on
//! `serde_json::Map` directly. These helpers keep that code short.

use serde_json::{Map, Value};

/// A JSON object keyed by filter name
pub type FilterMap = Map<String, Value>;

/// `null` or the empty string
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `null`, the empty string, an empty array or an empty object
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        other => is_blank(other),
    }
}

/// Copy of `map` without empty values (see [`is_empty_value`])
pub fn sanitized(map: &FilterMap) -> FilterMap {
    map.iter()
        .filter(|(_, v)| !is_empty_value(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Render a scalar as a string. Objects, arrays and null give `None`.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a value as an integer, accepting numeric strings
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Borrow `map[key]` as an object, replacing any non-object value
pub fn object_entry<'a>(map: &'a mut FilterMap, key: &str) -> &'a mut FilterMap {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just made an object"),
    }
}

/// Object at `map[key]`, if present and an object
pub fn object_at<'a>(map: &'a FilterMap, key: &str) -> Option<&'a FilterMap> {
    map.get(key).and_then(Value::as_object)
}

/// Shallow merge; keys in `source` win
pub fn merge_into(target: &mut FilterMap, source: &FilterMap) {
    for (k, v) in source {
        target.insert(k.clone(), v.clone());
    }
}

/// Remove `key` from `map[parent]`, dropping `parent` when it ends up empty
pub fn remove_nested(map: &mut FilterMap, parent: &str, key: &str) -> Option<Value> {
    let inner = map.get_mut(parent)?.as_object_mut()?;
    let removed = inner.remove(key);
    if inner.is_empty() {
        map.remove(parent);
    }
    removed
}

/// A `{"$gt": .., "$lt": ..}` range with string bounds
pub fn range_value(from: i64, to: i64) -> Value {
    let mut range = Map::new();
    range.insert("$gt".to_string(), Value::String(from.to_string()));
    range.insert("$lt".to_string(), Value::String(to.to_string()));
    Value::Object(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_blank(&json!([])));
    }

    #[test]
    fn test_object_entry_replaces_scalars() {
        let mut map = FilterMap::new();
        map.insert("custom_fields".into(), json!("oops"));
        object_entry(&mut map, "custom_fields").insert("a".into(), json!(1));
        assert_eq!(map["custom_fields"], json!({"a": 1}));
    }

    #[test]
    fn test_remove_nested_drops_empty_parent() {
        let mut map = json!({"exclude": {"custom_fields": {}}})
            .as_object()
            .cloned()
            .unwrap();
        remove_nested(&mut map, "exclude", "custom_fields");
        assert!(map.is_empty());
    }

    #[test]
    fn test_as_i64_accepts_strings() {
        assert_eq!(as_i64(&json!("1705276800")), Some(1_705_276_800));
        assert_eq!(as_i64(&json!(12)), Some(12));
        assert_eq!(as_i64(&json!("abc")), None);
    }
}
