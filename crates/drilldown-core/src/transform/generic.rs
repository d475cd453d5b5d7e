use super::{TransformInput, TransformOutput};
use crate::constants::{
    is_custom_field_key, is_time_filter_key, AZURE_TIME_FILTER_KEYS, GROUP_BY_TIME_FILTERS,
    PAGERDUTY_TIME_FILTER_KEYS, UNASSIGNED,
};
use crate::json::{is_empty_value, merge_into, object_entry};
use crate::types::FilterDocument;
use serde_json::Value;

/// Widget query merged with the dashboard query, plus the clicked value
pub fn generic(input: &TransformInput<'_>) -> TransformOutput {
    let across = input.across.to_string();
    let mut filter = input.widget_filter();
    merge_into(&mut filter, input.dashboard_query);

    let stacks = filter.remove("stacks");

    if let Some(value) = clicked_value(input) {
        if is_custom_field_key(&across) {
            object_entry(&mut filter, "custom_fields")
                .insert(across.clone(), Value::from(vec![value]));
        } else if !across.is_empty() && !is_time_across(&across) {
            filter.insert(input.across_key(), Value::from(vec![value]));
        }
    }

    let mut doc = FilterDocument::new(across.clone(), filter);
    if let Some(stacks) = stacks.filter(|s| !is_empty_value(s)) {
        doc.extra.insert("stacks".to_string(), stacks);
    }

    TransformOutput {
        across_value: across,
        filters: doc,
    }
}

/// The clicked category, with any unassigned bucket normalized
pub(crate) fn clicked_value(input: &TransformInput<'_>) -> Option<String> {
    input.context.x_axis.clicked_value().map(|value| {
        if value.contains("UNASSIGNED") {
            UNASSIGNED.to_string()
        } else {
            value
        }
    })
}

/// Acrosses that the date passes resolve into ranges
fn is_time_across(across: &str) -> bool {
    is_time_filter_key(across)
        || GROUP_BY_TIME_FILTERS.contains(&across)
        || AZURE_TIME_FILTER_KEYS.contains(&across)
        || PAGERDUTY_TIME_FILTER_KEYS.contains(&across)
        || across == "ticket_created"
}
