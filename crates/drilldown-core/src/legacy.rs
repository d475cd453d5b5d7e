//! Legacy filter-key migration
//!
//! Saved widgets may still use keys the backend has since renamed. Each
//! rename is applied at the top level, inside the partial-match object and
//! inside `exclude`.

use crate::json::FilterMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// Apply `renames` (old key to new key) to a filter
///
/// Running it twice gives the same result as running it once.
pub fn migrate_keys(filter: &mut FilterMap, renames: &BTreeMap<String, String>, partial_match_key: &str) {
    for (from, to) in renames {
        if from == to {
            continue;
        }
        rename(filter, from, to);
        for nested in [partial_match_key, "exclude"] {
            if let Some(Value::Object(inner)) = filter.get_mut(nested) {
                rename(inner, from, to);
            }
        }
    }
}

fn rename(map: &mut FilterMap, from: &str, to: &str) {
    match map.remove(from) {
        Some(Value::Null) | None => {}
        Some(value) => {
            map.insert(to.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn renames() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("ticket_categories".to_string(), "workitem_ticket_categories".to_string()),
            ("sprint".to_string(), "name".to_string()),
        ])
    }

    #[test]
    fn test_migrates_all_locations() {
        let mut filter = json!({
            "ticket_categories": ["Bugs"],
            "partial_match": {"sprint": {"$begins": "S1"}},
            "exclude": {"ticket_categories": ["Other"]},
            "statuses": ["Done"]
        })
        .as_object()
        .cloned()
        .unwrap();

        migrate_keys(&mut filter, &renames(), "partial_match");

        assert_eq!(
            Value::Object(filter),
            json!({
                "workitem_ticket_categories": ["Bugs"],
                "partial_match": {"name": {"$begins": "S1"}},
                "exclude": {"workitem_ticket_categories": ["Other"]},
                "statuses": ["Done"]
            })
        );
    }

    #[test]
    fn test_idempotent() {
        let mut once = json!({"sprint": "S1", "exclude": {"sprint": ["S0"]}})
            .as_object()
            .cloned()
            .unwrap();
        migrate_keys(&mut once, &renames(), "partial_match");
        let mut twice = once.clone();
        migrate_keys(&mut twice, &renames(), "partial_match");
        assert_eq!(once, twice);
    }
}
