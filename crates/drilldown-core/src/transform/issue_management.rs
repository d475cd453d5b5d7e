//! Jira and Azure DevOps issue-management transforms

use super::generic::{clicked_value, generic};
use super::{TransformInput, TransformKind, TransformOutput};
use crate::constants::{business_alignment as ba, is_custom_field_key, UNASSIGNED};
use crate::dates;
use crate::json::{as_i64, merge_into, object_at, FilterMap};
use crate::normalize::drop_unsanitized_arrays;
use crate::registry::ReportFamily;
use crate::types::{FilterDocument, XAxis};
use serde_json::{Map, Value};

const NO_UPDATE_TIME_FIELD: &str = "no_update_time_field";
const NO_UPDATE_DASHBOARD_TIME: &str = "no_update_dashboard_time";

/// Widget custom fields overlaid with the dashboard's and the clicked custom across
fn merged_custom_fields(input: &TransformInput<'_>, clicked: Option<Value>) -> FilterMap {
    let mut custom = object_at(input.dashboard_query, "custom_fields")
        .cloned()
        .unwrap_or_default();
    if let Some(value) = clicked {
        if is_custom_field_key(input.across) {
            custom.insert(input.across.to_string(), value);
        }
    }
    let mut merged = object_at(&input.widget.query, "custom_fields")
        .cloned()
        .unwrap_or_default();
    merge_into(&mut merged, &custom);
    merged
}

/// Merge two hygiene bundles (`{filter, missing_fields}`); `over` wins
///
/// Custom-field maps, their excluded counterparts and `missing_fields` are
/// unioned rather than replaced, with the widget's own custom fields last.
fn merge_hygiene_bundle(under: &FilterMap, over: &FilterMap, widget: &FilterMap, custom_key: &str) -> FilterMap {
    let empty = FilterMap::new();
    let under_filter = object_at(under, "filter").unwrap_or(&empty);
    let over_filter = object_at(over, "filter").unwrap_or(&empty);

    let mut filter = under_filter.clone();
    merge_into(&mut filter, over_filter);

    let mut missing = object_at(under, "missing_fields").cloned().unwrap_or_default();
    merge_into(&mut missing, object_at(over, "missing_fields").unwrap_or(&empty));
    filter.insert("missing_fields".to_string(), Value::Object(missing));

    let mut exclude = object_at(under_filter, "exclude").cloned().unwrap_or_default();
    merge_into(&mut exclude, object_at(over_filter, "exclude").unwrap_or(&empty));
    let mut excluded_custom = FilterMap::new();
    for source in [under_filter, over_filter, widget] {
        if let Some(fields) = object_at(source, "exclude").and_then(|e| object_at(e, custom_key)) {
            merge_into(&mut excluded_custom, fields);
        }
    }
    exclude.insert(custom_key.to_string(), Value::Object(excluded_custom));
    filter.insert("exclude".to_string(), Value::Object(exclude));

    let mut custom = FilterMap::new();
    for source in [under_filter, over_filter, widget] {
        if let Some(fields) = object_at(source, custom_key) {
            merge_into(&mut custom, fields);
        }
    }
    filter.insert(custom_key.to_string(), Value::Object(custom));
    filter
}

fn bundle(filter: &FilterMap) -> FilterMap {
    let mut wrapped = Map::new();
    wrapped.insert("filter".to_string(), Value::Object(filter.clone()));
    wrapped
}

/// Generic, plus custom-field merging, hygiene trends and trend snapshots
pub fn jira(input: &TransformInput<'_>) -> TransformOutput {
    let TransformOutput {
        across_value,
        mut filters,
    } = generic(input);
    let descriptor = input.descriptor;
    let x_axis = &input.context.x_axis;

    if let XAxis::Label(label) = x_axis {
        let clicked = Value::from(vec![label.clone()]);
        let custom = merged_custom_fields(input, Some(clicked));
        if !custom.is_empty() {
            filters
                .filter
                .insert("custom_fields".to_string(), Value::Object(custom));
        }
    }

    if descriptor.has_family(ReportFamily::HygieneTrend) {
        let addition = &input.context.addition_filter;
        match addition.get("hygiene_types") {
            Some(types) if addition.len() == 1 => {
                let key = if input.application() == "azure_devops" {
                    "workitem_hygiene_types"
                } else {
                    "hygiene_types"
                };
                filters.filter.insert(key.to_string(), types.clone());
            }
            _ => {
                let mut merged = merge_hygiene_bundle(
                    &bundle(&filters.filter),
                    addition,
                    &input.widget_filter(),
                    "custom_fields",
                );
                merged.insert("hygiene_types".to_string(), Value::Array(Vec::new()));
                filters.filter = merged;
            }
        }
    }

    drop_unsanitized_arrays(&mut filters.filter);

    if descriptor.has_family(ReportFamily::BusinessAlignment)
        && descriptor.transform != Some(TransformKind::EffortInvestmentEngineer)
    {
        filters.filter.remove(ba::CATEGORIZATION_UNIT);
        filters.filter.remove("completed_at");
    }

    if across_value == "trend" {
        let stamp = x_axis.label().and_then(|label| {
            if descriptor.label_to_timestamp {
                dates::parse_day_label(&label)
            } else {
                label.trim().parse::<i64>().ok()
            }
        });
        if let Some(stamp) = stamp {
            let stamp = clamp_to_now(stamp, input);
            filters.filter.insert("ingested_at".to_string(), Value::from(stamp));
        }
        filters.filter.remove("across");
    }

    if input.application() == "azure_devops" {
        if let Some(sprint) = filters.filter.remove("sprint") {
            filters
                .filter
                .insert("workitem_sprint_full_names".to_string(), sprint);
        }
    }

    TransformOutput {
        across_value,
        filters,
    }
}

fn clamp_to_now(stamp: i64, input: &TransformInput<'_>) -> i64 {
    match input.now {
        Some(now) if input.descriptor.compare_x_axis_timestamp && now < stamp => now,
        _ => stamp,
    }
}

/// Jira plus azure code areas and parent work items
pub fn azure(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = jira(input);
    if out.across_value == "code_area" {
        out.filters.filter.insert(
            "code_area".to_string(),
            Value::Array(vec![input.context.x_axis.to_value()]),
        );
    }
    if out.across_value == "parent_workitem_id" && input.widget.report_type == crate::constants::AZURE_TICKETS_REPORT {
        out.filters.filter.remove("workitem_parent_workitem_types");
    }
    out
}

fn hygiene(input: &TransformInput<'_>, across: &str, custom_key: &str, reset_types: bool) -> TransformOutput {
    let widget_filter = input.widget_filter();
    let mut filter = widget_filter.clone();
    merge_into(&mut filter, input.dashboard_query);

    match &input.context.x_axis {
        XAxis::Label(_) | XAxis::Epoch(_) => {
            let custom = merged_custom_fields(input, None);
            if !custom.is_empty() {
                filter.insert("custom_fields".to_string(), Value::Object(custom));
            }
            let value = clicked_value(input)
                .map(|v| if v == UNASSIGNED { v } else { v.to_lowercase() })
                .unwrap_or_default();
            let key = crate::constants::values_to_filters(across).unwrap_or(across);
            filter.insert(key.to_string(), Value::from(vec![value]));
        }
        XAxis::Point(point) => {
            filter = merge_hygiene_bundle(point, &bundle(&filter), &widget_filter, custom_key);
            if reset_types {
                filter.insert("hygiene_types".to_string(), Value::Array(Vec::new()));
            }
        }
        XAxis::Missing => {}
    }

    TransformOutput {
        across_value: across.to_string(),
        filters: FilterDocument::new(across, filter),
    }
}

/// Hygiene report grouped by hygiene type
pub fn jira_hygiene(input: &TransformInput<'_>) -> TransformOutput {
    hygiene(input, "hygiene_type", "custom_fields", true)
}

/// Azure hygiene report grouped by work-item hygiene type
pub fn azure_hygiene(input: &TransformInput<'_>) -> TransformOutput {
    hygiene(input, "workitem_hygiene_types", "workitem_custom_fields", false)
}

/// Jira plus a day range for created/updated buckets
pub fn jira_bounce(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = jira(input);
    if matches!(out.across_value.as_str(), "issue_created" | "issue_updated") {
        if let Some(range) = dates::day_range(&input.context.x_axis) {
            out.filters
                .filter
                .insert(format!("{}_at", out.across_value), range.to_value());
            out.filters
                .filter
                .insert(NO_UPDATE_TIME_FIELD.to_string(), Value::Bool(true));
        }
    }
    out
}

/// Backlog snapshot at the clicked ingestion time
pub fn jira_backlog(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = generic(input);
    let x_axis = &input.context.x_axis;
    let custom = merged_custom_fields(input, Some(Value::from(vec![x_axis.to_value()])));
    out.filters
        .filter
        .insert("custom_fields".to_string(), Value::Object(custom));
    if let Some(stamp) = as_i64(&x_axis.to_value()) {
        out.filters
            .filter
            .insert("ingested_at".to_string(), Value::from(clamp_to_now(stamp, input)));
    }
    out
}

/// Azure backlog snapshot; date-typed custom acrosses become point ranges
pub fn azure_backlog_trend(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = generic(input);
    let x_axis = &input.context.x_axis;

    if let XAxis::Label(label) = x_axis {
        let mut clicked = Value::from(vec![label.clone()]);
        let mut pinned = false;
        if is_custom_field_key(input.across) {
            if let Some(day) = dates::parse_loose_anchor(x_axis).and_then(|d| dates::bucket(d, dates::Interval::Day)) {
                let stamp = day.from.to_string();
                let mut point = Map::new();
                point.insert("$gt".to_string(), Value::String(stamp.clone()));
                point.insert("$lt".to_string(), Value::String(stamp));
                clicked = Value::Object(point);
                pinned = true;
            }
        }
        let custom = merged_custom_fields(input, Some(clicked));
        let filter = &mut out.filters.filter;
        filter.insert("custom_fields".to_string(), Value::Object(custom));
        if pinned {
            filter.insert(NO_UPDATE_TIME_FIELD.to_string(), Value::Bool(true));
            filter.insert(NO_UPDATE_DASHBOARD_TIME.to_string(), Value::Bool(true));
        }
    }

    drop_unsanitized_arrays(&mut out.filters.filter);

    if let Some(stamp) = as_i64(&x_axis.to_value()) {
        out.filters
            .filter
            .insert("ingested_at".to_string(), Value::from(clamp_to_now(stamp, input)));
    }
    out
}

/// Jira without the business-alignment time range
pub fn jira_burndown(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = jira(input);
    out.filters.filter.remove(ba::TIME_RANGE);
    out
}

/// Jira without grouping, interval, sort and time range
pub fn epic_priority(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = jira(input);
    for key in ["across", "interval", "sort", ba::TIME_RANGE] {
        out.filters.filter.remove(key);
    }
    out
}
