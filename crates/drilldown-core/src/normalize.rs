//! Filter normalization helpers
//!
//! These run late in the pipeline and bring a filter into the shape the
//! aggregation API accepts.

use crate::json::{is_blank, object_entry, scalar_string, FilterMap};
use serde_json::{Map, Value};

/// Drop empty or non-string partial-match entries and trim the rest
///
/// The partial-match key is removed when nothing survives.
pub fn sanitize_partial_match(filter: &mut FilterMap, partial_key: &str) {
    let Some(partial) = filter.remove(partial_key) else {
        return;
    };
    let Value::Object(partial) = partial else {
        return;
    };
    let cleaned: FilterMap = partial
        .into_iter()
        .filter_map(|(key, value)| trim_partial_value(value).map(|v| (key, v)))
        .collect();
    if !cleaned.is_empty() {
        filter.insert(partial_key.to_string(), Value::Object(cleaned));
    }
}

fn trim_partial_value(value: Value) -> Option<Value> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        Value::Object(ops) => {
            let ops: Map<String, Value> = ops
                .into_iter()
                .filter_map(|(op, v)| match v {
                    Value::String(s) if !s.trim().is_empty() => {
                        Some((op, Value::String(s.trim().to_string())))
                    }
                    _ => None,
                })
                .collect();
            (!ops.is_empty()).then_some(Value::Object(ops))
        }
        _ => None,
    }
}

/// Remove keys whose value is `null` or `""`; empty arrays stay
pub fn remove_empty_keys(filter: &mut FilterMap) {
    filter.retain(|_, v| !is_blank(v));
}

/// Remove array filters none of whose elements carry a value
pub fn drop_unsanitized_arrays(filter: &mut FilterMap) {
    filter.retain(|_, v| match v {
        Value::Array(items) => items.iter().any(|item| !is_blank(item)),
        _ => true,
    });
}

/// Fold azure-only `teams` and `code_area` into `workitem_attributes`
pub fn fold_azure_attributes(filter: &mut FilterMap) {
    for key in ["teams", "code_area"] {
        if let Some(value) = filter.remove(key) {
            object_entry(filter, "workitem_attributes").insert(key.to_string(), value);
        }
    }
    let Some(Value::Object(attributes)) = filter.get_mut("workitem_attributes") else {
        return;
    };
    if let Some(Value::Array(areas)) = attributes.get_mut("code_area") {
        for area in areas.iter_mut() {
            if let Value::Object(node) = area {
                let child = node.get("child").and_then(scalar_string).unwrap_or_default();
                *area = Value::String(child);
            }
        }
    }
}

/// Fold azure iteration selections into sprint full names
///
/// Iteration objects `{parent, child}` become `parent\child`. An explicit
/// `workitem_sprint_full_names` filter takes precedence.
pub fn fold_azure_iteration(filter: &mut FilterMap, partial_key: &str) {
    let has_full_names = filter.contains_key("workitem_sprint_full_names");

    if let Some(Value::Object(exclude)) = filter.get_mut("exclude") {
        if let Some(iterations) = exclude.remove("azure_iteration") {
            if !has_full_names {
                exclude.insert("workitem_sprint_full_names".to_string(), iteration_names(&iterations));
            }
        }
    }

    if let Some(Value::Object(partial)) = filter.get_mut(partial_key) {
        if let Some(value) = partial.remove("azure_iteration") {
            partial.insert("workitem_milestone_full_name".to_string(), value);
        }
    }

    if let Some(iterations) = filter.remove("azure_iteration") {
        if !has_full_names {
            filter.insert("workitem_sprint_full_names".to_string(), iteration_names(&iterations));
        }
    }
}

fn iteration_names(value: &Value) -> Value {
    let names = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(node) => {
                    let parent = node.get("parent").and_then(scalar_string).unwrap_or_default();
                    let child = node.get("child").and_then(scalar_string).unwrap_or_default();
                    Value::String(format!("{parent}\\{child}"))
                }
                other => other.clone(),
            })
            .collect(),
        other => vec![other.clone()],
    };
    Value::Array(names)
}

/// Sprint-goal reports filter sprints by substring and state by scalar
pub fn sprint_goal(filter: &mut FilterMap, partial_key: &str) {
    if filter.get("state").and_then(Value::as_str) == Some("active") {
        filter.remove("completed_at");
    }
    if let Some(sprint) = filter.remove("sprint") {
        if !sprint.is_null() {
            let mut contains = Map::new();
            contains.insert("$contains".to_string(), sprint);
            object_entry(filter, partial_key).insert("sprint".to_string(), Value::Object(contains));
        }
    }
    if let Some(states) = filter.remove("jira_sprint_states") {
        let first = match states {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        };
        filter.insert("state".to_string(), first);
    }
}

/// Replace the `UNRESOLVED` resolution with the empty string
pub fn unresolved_resolutions(filter: &mut FilterMap) {
    if let Some(Value::Array(resolutions)) = filter.get_mut("resolutions") {
        for resolution in resolutions.iter_mut() {
            if resolution.as_str() == Some("UNRESOLVED") {
                *resolution = Value::String(String::new());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> FilterMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_partial_match_sanitize() {
        let mut filter = map(json!({
            "partial_match": {
                "summary": {"$contains": "  login  "},
                "empty": {"$begins": ""},
                "numeric": 5,
                "plain": " x "
            }
        }));
        sanitize_partial_match(&mut filter, "partial_match");
        assert_eq!(
            Value::Object(filter),
            json!({"partial_match": {"summary": {"$contains": "login"}, "plain": "x"}})
        );

        let mut filter = map(json!({"partial_match": {"empty": {}}}));
        sanitize_partial_match(&mut filter, "partial_match");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_remove_empty_keys_keeps_empty_arrays() {
        let mut filter = map(json!({"a": null, "b": "", "c": [], "d": {}, "e": 0}));
        remove_empty_keys(&mut filter);
        assert_eq!(Value::Object(filter), json!({"c": [], "d": {}, "e": 0}));
    }

    #[test]
    fn test_drop_unsanitized_arrays() {
        let mut filter = map(json!({"a": [""], "b": [], "c": ["", "x"], "d": "keep"}));
        drop_unsanitized_arrays(&mut filter);
        assert_eq!(Value::Object(filter), json!({"c": ["", "x"], "d": "keep"}));
    }

    #[test]
    fn test_fold_azure_attributes() {
        let mut filter = map(json!({
            "teams": ["Red"],
            "code_area": [{"parent": "Root", "child": "Web"}, "Legacy"]
        }));
        fold_azure_attributes(&mut filter);
        assert_eq!(
            Value::Object(filter),
            json!({"workitem_attributes": {"teams": ["Red"], "code_area": ["Web", "Legacy"]}})
        );
    }

    #[test]
    fn test_fold_azure_iteration() {
        let mut filter = map(json!({
            "azure_iteration": [{"parent": "Proj", "child": "Sprint 1"}],
            "exclude": {"azure_iteration": ["Proj\\Sprint 0"]},
            "partial_match": {"azure_iteration": {"$begins": "Proj"}}
        }));
        fold_azure_iteration(&mut filter, "partial_match");
        assert_eq!(
            Value::Object(filter),
            json!({
                "workitem_sprint_full_names": ["Proj\\Sprint 1"],
                "exclude": {"workitem_sprint_full_names": ["Proj\\Sprint 0"]},
                "partial_match": {"workitem_milestone_full_name": {"$begins": "Proj"}}
            })
        );
    }

    #[test]
    fn test_fold_azure_iteration_keeps_explicit_names() {
        let mut filter = map(json!({
            "azure_iteration": [{"parent": "Proj", "child": "Sprint 1"}],
            "workitem_sprint_full_names": ["Proj\\Sprint 9"]
        }));
        fold_azure_iteration(&mut filter, "partial_match");
        assert_eq!(
            Value::Object(filter),
            json!({"workitem_sprint_full_names": ["Proj\\Sprint 9"]})
        );
    }

    #[test]
    fn test_sprint_goal() {
        let mut filter = map(json!({
            "state": "active",
            "completed_at": {"$gt": "1"},
            "sprint": "Sprint 4",
            "jira_sprint_states": ["closed", "active"]
        }));
        sprint_goal(&mut filter, "partial_match");
        assert_eq!(
            Value::Object(filter),
            json!({"state": "closed", "partial_match": {"sprint": {"$contains": "Sprint 4"}}})
        );
    }

    #[test]
    fn test_unresolved_resolutions() {
        let mut filter = map(json!({"resolutions": ["UNRESOLVED", "Fixed"]}));
        unresolved_resolutions(&mut filter);
        assert_eq!(filter["resolutions"], json!(["", "Fixed"]));
    }
}
