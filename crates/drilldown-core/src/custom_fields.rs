//! Custom-field namespace mapping and sanitation
//!
//! Widgets store custom-field filters under a generic `custom_fields` key.
//! Each backend expects them under its own namespace, e.g.
//! `jira_custom_fields` or `workitem_custom_fields`, and expects partial
//! matches on custom fields to carry the backend's prefix.

use crate::constants::{is_custom_field_key, AZURE_CUSTOM_FIELDS_KEY, AZURE_CUSTOM_FIELD_PREFIX, CUSTOM_FIELD_PREFIX};
use crate::json::{is_empty_value, object_at, object_entry, FilterMap};
use crate::registry::ReportDescriptor;
use crate::types::CustomFieldDef;
use serde_json::Value;

const GENERIC_KEY: &str = "custom_fields";

/// Prefixes stripped from partial-match keys before checking support
const PARTIAL_MATCH_PREFIXES: &[&str] = &["jira_", "workitem_"];

/// Move generic custom fields into the descriptor's namespace
///
/// No-op when the descriptor has no `custom_field_key`.
pub fn apply_namespace(filter: &mut FilterMap, descriptor: &ReportDescriptor) {
    let Some(namespace) = descriptor.custom_field_key.as_deref() else {
        return;
    };
    let partial_key = descriptor.partial_match_key.as_str();

    if let Some(Value::Object(partial)) = filter.remove(partial_key) {
        let prefixed: FilterMap = partial
            .into_iter()
            .filter(|(_, v)| !is_empty_value(v))
            .map(|(k, v)| {
                if k.contains(CUSTOM_FIELD_PREFIX) && !k.starts_with(&descriptor.custom_field_prefix) {
                    (format!("{}{}", descriptor.custom_field_prefix, k), v)
                } else {
                    (k, v)
                }
            })
            .collect();
        if !prefixed.is_empty() {
            filter.insert(partial_key.to_string(), Value::Object(prefixed));
        }
    }

    if namespace != GENERIC_KEY {
        move_into_namespace(filter, namespace);
        if let Some(Value::Object(exclude)) = filter.get_mut("exclude") {
            move_into_namespace(exclude, namespace);
        }
    }
}

fn move_into_namespace(map: &mut FilterMap, namespace: &str) {
    let Some(generic) = map.remove(GENERIC_KEY) else {
        return;
    };
    if let Value::Object(fields) = generic {
        if !fields.is_empty() {
            let target = object_entry(map, namespace);
            for (k, v) in fields {
                target.insert(k, v);
            }
        }
    }
}

/// Drop custom-field filters the integration does not support
///
/// 1. Partial-match keys that duplicate an exact custom-field filter go,
///    as do exclude entries duplicating one.
/// 2. Custom-field entries (exact and excluded) outside `supported` go.
/// 3. Partial custom-field keys that are unsupported or date-typed go.
pub fn sanitize_unsupported(filter: &mut FilterMap, supported: &[CustomFieldDef], partial_key: &str) {
    let custom_keys: Vec<String> = filter
        .keys()
        .filter(|k| k.contains(GENERIC_KEY))
        .cloned()
        .collect();

    for key in &custom_keys {
        let fields: Vec<String> = object_at(filter, key)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        for field in &fields {
            if let Some(Value::Object(partial)) = filter.get_mut(partial_key) {
                partial.retain(|partial_field, _| !partial_field.contains(field.as_str()));
            }
            if let Some(Value::Object(exclude)) = filter.get_mut("exclude") {
                if let Some(Value::Object(excluded)) = exclude.get_mut(key) {
                    excluded.remove(field);
                }
            }
        }
    }

    let is_supported = |key: &str| supported.iter().any(|f| f.field_key == key);

    for key in &custom_keys {
        if let Some(Value::Object(fields)) = filter.get_mut(key) {
            fields.retain(|k, _| is_supported(k));
        }
    }

    if let Some(Value::Object(exclude)) = filter.get_mut("exclude") {
        for (key, value) in exclude.iter_mut() {
            if !key.contains(GENERIC_KEY) {
                continue;
            }
            if let Value::Object(fields) = value {
                fields.retain(|k, _| is_supported(k));
            }
        }
    }

    if let Some(Value::Object(partial)) = filter.get_mut(partial_key) {
        partial.retain(|key, _| {
            if !key.to_lowercase().contains("custom") {
                return true;
            }
            let bare = PARTIAL_MATCH_PREFIXES
                .iter()
                .find_map(|p| key.strip_prefix(p))
                .unwrap_or(key);
            let is_date = supported
                .iter()
                .any(|f| f.is_date() && (f.field_key == bare || f.field_key == *key));
            is_supported(bare) && !is_date
        });
    }
}

/// Strip the `Custom.` prefix from Azure custom-field filters whose field
/// is marked transformed, in the exact, excluded and partial-match maps
pub fn strip_transformed_prefix(filter: &mut FilterMap, supported: &[CustomFieldDef], partial_key: &str) {
    let rekey = |fields: &mut FilterMap| {
        *fields = std::mem::take(fields)
            .into_iter()
            .map(|(key, value)| {
                let transformed = supported
                    .iter()
                    .find(|f| f.field_key == key || key.contains(f.field_key.as_str()))
                    .is_some_and(CustomFieldDef::is_transformed);
                if transformed {
                    (key.replacen(AZURE_CUSTOM_FIELD_PREFIX, "", 1), value)
                } else {
                    (key, value)
                }
            })
            .collect();
    };

    if let Some(Value::Object(fields)) = filter.get_mut(AZURE_CUSTOM_FIELDS_KEY) {
        rekey(fields);
    }
    if let Some(Value::Object(exclude)) = filter.get_mut("exclude") {
        if let Some(Value::Object(fields)) = exclude.get_mut(AZURE_CUSTOM_FIELDS_KEY) {
            rekey(fields);
        }
    }
    if let Some(Value::Object(partial)) = filter.get_mut(partial_key) {
        rekey(partial);
    }
}

/// `true` when `across` names a custom field rather than a built-in dimension
pub fn is_custom_across(across: &str) -> bool {
    is_custom_field_key(across)
}
