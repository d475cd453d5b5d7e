//! Passes that rename, move and drop filter keys

use super::PassContext;
use crate::constants::{
    priority_order, ACTIVE_SPRINT_TYPE_FILTER_KEY, AZURE_APPLICATION, IM_ADO_PROFILE, CUSTOM_FIELD_STACK_FLAG, LEAD_TIME_BY_TIME_SPENT_IN_STAGES_REPORT,
    LEAD_TIME_STAGE_FILTER_KEY, SORT_FILTER_KEY, TICKETS_REPORT,
};
use crate::custom_fields;
use crate::json::{is_blank, scalar_string};
use crate::legacy;
use crate::normalize;
use crate::registry::ReportFamily;
use crate::types::{FilterDocument, XAxis};
use serde_json::Value;

const UPDATE_MARKERS: &[&str] = &["no_update_time_field", "no_update_dashboard_time"];

pub(super) fn partial_match_sanitize(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    normalize::sanitize_partial_match(&mut doc.filter, &ctx.descriptor.partial_match_key);
    doc
}

/// Transforms leave markers for the time passes; they never reach the API
pub(super) fn clear_update_markers(mut doc: FilterDocument, _ctx: &PassContext<'_>) -> FilterDocument {
    for marker in UPDATE_MARKERS {
        doc.filter.remove(*marker);
    }
    doc
}

pub(super) fn parent_keys(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if ctx.report_type() != TICKETS_REPORT || ctx.across != "parent" {
        return doc;
    }
    if let Some(label) = ctx.x_axis().clicked_value() {
        doc.filter.remove("parent");
        doc.filter
            .insert("parent_keys".to_string(), Value::Array(vec![Value::String(label)]));
    }
    doc
}

fn work_items_type(application: &str) -> Option<&'static str> {
    match application {
        "azure_devops" => Some("work_item"),
        "jira" | "jira_velocity" => Some("jira"),
        _ => None,
    }
}

/// Lead-time reports filter on the clicked stage of the velocity profile
pub(super) fn velocity_profile(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::VelocityProfile) {
        return doc;
    }
    doc.filter.remove("values");
    if let Some(kind) = work_items_type(ctx.application()) {
        doc.filter
            .insert("work_items_type".to_string(), Value::String(kind.to_string()));
    }

    let by_stage = ctx.descriptor.has_family(ReportFamily::LeadTimeByStage);
    let stage_value = |name: Value| {
        if by_stage {
            name
        } else {
            Value::Array(vec![name])
        }
    };
    let stage_key = if by_stage {
        LEAD_TIME_STAGE_FILTER_KEY
    } else {
        "value_stage_names"
    };

    match ctx.x_axis() {
        XAxis::Point(point) => {
            if let Some(name) = point.get("stageName").filter(|v| !is_blank(v)) {
                doc.filter.insert(stage_key.to_string(), stage_value(name.clone()));
            }
            if let Some(task) = point.get("taskType").filter(|v| !is_blank(v)) {
                doc.filter
                    .insert("value_jira_issue_types".to_string(), Value::Array(vec![task.clone()]));
            }
            if let Some(value) = point.get("value").filter(|v| !is_blank(v)) {
                doc.filter
                    .insert("value_trend_keys".to_string(), Value::Array(vec![value.clone()]));
            }
            doc.across = Some("values".to_string());
        }
        XAxis::Missing => {}
        other => {
            if ctx.report_type() == LEAD_TIME_BY_TIME_SPENT_IN_STAGES_REPORT {
                return doc;
            }
            let label = other.label().unwrap_or_default();
            if !(by_stage && label == "Total") {
                doc.filter
                    .insert(stage_key.to_string(), stage_value(Value::String(label)));
            }
            doc.across = Some("values".to_string());
        }
    }
    doc
}

pub(super) fn custom_field_namespace(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    custom_fields::apply_namespace(&mut doc.filter, ctx.descriptor);
    doc
}

/// `tickets_report` lists the unresolved bucket last, as `""`
pub(super) fn unresolved_last(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if ctx.report_type() != TICKETS_REPORT {
        return doc;
    }
    if let Some(Value::Array(resolutions)) = doc.filter.get_mut("resolutions") {
        let before = resolutions.len();
        resolutions.retain(|r| r.as_str() != Some("UNRESOLVED"));
        if resolutions.len() != before {
            resolutions.push(Value::String(String::new()));
        }
    }
    doc
}

pub(super) fn scm_files_filename(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::ScmFiles) {
        return doc;
    }
    if let Some(filename) = ctx.request.context.addition_filter.get("filename") {
        doc.filter.insert("filename".to_string(), filename.clone());
    }
    doc
}

pub(super) fn sprint_single_stat_flags(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let flags: &[&str] = if ctx.descriptor.has_family(ReportFamily::SprintSingleStatJira) {
        &["include_issue_keys", "include_total_count"]
    } else if ctx.descriptor.has_family(ReportFamily::SprintSingleStatAzure) {
        &["include_workitem_ids"]
    } else {
        &[]
    };
    for flag in flags {
        doc.filter.insert(flag.to_string(), Value::Bool(true));
    }
    doc
}

/// Azure priorities are filtered by their numeric order
pub(super) fn azure_priorities(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::IssueManagement)
        || !ctx.application().contains("azure_devops")
        || doc.across() != "priority"
    {
        return doc;
    }
    if let Some(Value::Array(priorities)) = doc.filter.get("workitem_priorities") {
        let mapped: Vec<Value> = priorities
            .iter()
            .filter(|p| !is_blank(p))
            .filter_map(scalar_string)
            .map(|name| match priority_order(&name) {
                Some(order) => Value::String(order.to_string()),
                None => Value::String(name),
            })
            .collect();
        doc.filter
            .insert("workitem_priorities".to_string(), Value::Array(mapped));
    }
    doc
}

pub(super) fn normalize(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    normalize::remove_empty_keys(&mut doc.filter);
    normalize::fold_azure_attributes(&mut doc.filter);
    normalize::fold_azure_iteration(&mut doc.filter, &ctx.descriptor.partial_match_key);
    doc
}

pub(super) fn sprint_goal(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if ctx.descriptor.has_family(ReportFamily::SprintGoal) {
        normalize::sprint_goal(&mut doc.filter, &ctx.descriptor.partial_match_key);
    }
    doc
}

pub(super) fn drop_sort_and_teams(mut doc: FilterDocument, _ctx: &PassContext<'_>) -> FilterDocument {
    doc.filter.remove(SORT_FILTER_KEY);
    doc.filter.remove("teams");
    doc
}

pub(super) fn legacy_keys(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    legacy::migrate_keys(
        &mut doc.filter,
        &ctx.descriptor.legacy_key_renames,
        &ctx.descriptor.partial_match_key,
    );
    doc
}

pub(super) fn custom_date_sanitize(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let supported = &ctx.request.context.supported_custom_fields;
    if !supported.is_empty() {
        custom_fields::sanitize_unsupported(&mut doc.filter, supported, &ctx.descriptor.partial_match_key);
    }
    doc
}

/// Azure issue-management reports, and DORA reports on an Azure profile, store
/// transformed custom fields under their bare names
pub(super) fn azure_custom_fields(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let application = ctx.application();
    let azure_issues = ctx.descriptor.has_family(ReportFamily::IssueManagement) && application == AZURE_APPLICATION;
    let azure_dora = application == "any"
        && ctx.request.context.dora_profile_integration_type.as_deref() == Some(IM_ADO_PROFILE);
    if azure_issues || azure_dora {
        custom_fields::strip_transformed_prefix(
            &mut doc.filter,
            &ctx.request.context.supported_custom_fields,
            &ctx.descriptor.partial_match_key,
        );
    }
    doc
}

/// Velocity widgets and jira widgets name the active-sprint filter differently
pub(super) fn active_sprint_swap(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let (from, to) = match ctx.application() {
        "jira_velocity" => ("sprint_states", ACTIVE_SPRINT_TYPE_FILTER_KEY),
        "jira" => (ACTIVE_SPRINT_TYPE_FILTER_KEY, "sprint_states"),
        _ => return doc,
    };
    match doc.filter.remove(from) {
        Some(value) if !is_blank(&value) => {
            doc.filter.insert(to.to_string(), value);
        }
        Some(value) => {
            doc.filter.insert(from.to_string(), value);
        }
        None => {}
    }
    doc
}

pub(super) fn unsupported_filters(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    for key in &ctx.descriptor.unsupported_filter_keys {
        doc.filter.remove(key);
    }
    doc
}

/// Custom-field stacks travel as top-level `stacks`
pub(super) fn custom_stacks(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::IssueManagement) {
        return doc;
    }
    let custom = doc
        .filter
        .get("custom_stacks")
        .and_then(Value::as_array)
        .filter(|stacks| !stacks.is_empty())
        .cloned();
    let has_stacks = doc
        .extra
        .get("stacks")
        .and_then(Value::as_array)
        .is_some_and(|stacks| {
            stacks
                .iter()
                .any(|s| s.as_str() != Some(CUSTOM_FIELD_STACK_FLAG))
        });

    if let Some(custom) = custom {
        doc.extra.insert("stacks".to_string(), Value::Array(custom));
        doc.filter.remove("custom_stacks");
    } else if !has_stacks {
        doc.filter.remove("custom_stacks");
        doc.extra.remove("stacks");
    }
    doc
}

pub(super) fn sprint_distribution_keys(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::SprintDistribution) {
        return doc;
    }
    if let Some(keys) = ctx.x_axis().point_lenient().and_then(|mut p| p.remove("keys")) {
        doc.filter.insert("keys".to_string(), keys);
    }
    doc
}

pub(super) fn resolutions(mut doc: FilterDocument, _ctx: &PassContext<'_>) -> FilterDocument {
    normalize::unresolved_resolutions(&mut doc.filter);
    doc
}

/// Only some reports take the bucket interval, and never inside the filter
pub(super) fn interval(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    doc.filter.remove("interval");
    doc.interval = if ctx.descriptor.include_interval_in_payload {
        ctx.interval.cloned()
    } else {
        None
    };
    doc
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{doc, run_pass};
    use super::*;
    use crate::registry::ReportDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tickets() -> ReportDescriptor {
        ReportDescriptor::builder("tickets_report", "jira").build()
    }

    #[test]
    fn test_markers_are_cleared() {
        let out = run_pass(
            clear_update_markers,
            &tickets(),
            json!({}),
            "status",
            doc("status", json!({"no_update_time_field": true, "no_update_dashboard_time": true, "x": 1})),
        );
        assert_eq!(Value::Object(out.filter), json!({"x": 1}));
    }

    #[test]
    fn test_parent_keys() {
        let out = run_pass(
            parent_keys,
            &tickets(),
            json!({"context": {"x_axis": "LEV-12"}}),
            "parent",
            doc("parent", json!({"parent": ["LEV-12"]})),
        );
        assert_eq!(Value::Object(out.filter), json!({"parent_keys": ["LEV-12"]}));
    }

    #[test]
    fn test_velocity_profile_point() {
        let descriptor = ReportDescriptor::builder("lead_time_by_stage_report", "jira")
            .families([ReportFamily::VelocityProfile, ReportFamily::LeadTimeByStage])
            .build();
        let out = run_pass(
            velocity_profile,
            &descriptor,
            json!({"context": {"application": "jira_velocity", "x_axis": {"stageName": "Dev", "taskType": "Bug"}}}),
            "velocity",
            doc("velocity", json!({"values": ["x"]})),
        );
        assert_eq!(out.across.as_deref(), Some("values"));
        assert_eq!(
            Value::Object(out.filter),
            json!({"work_items_type": "jira", "histogram_stage_name": "Dev", "value_jira_issue_types": ["Bug"]})
        );
    }

    #[test]
    fn test_velocity_profile_labels() {
        let descriptor = ReportDescriptor::builder("lead_time_trend_report", "jira")
            .family(ReportFamily::VelocityProfile)
            .build();
        let out = run_pass(
            velocity_profile,
            &descriptor,
            json!({"context": {"application": "azure_devops", "x_axis": "QA"}}),
            "trend",
            doc("trend", json!({})),
        );
        assert_eq!(out.filter["value_stage_names"], json!(["QA"]));
        assert_eq!(out.filter["work_items_type"], json!("work_item"));

        let by_stage = ReportDescriptor::builder("lead_time_by_stage_report", "jira")
            .families([ReportFamily::VelocityProfile, ReportFamily::LeadTimeByStage])
            .build();
        let out = run_pass(
            velocity_profile,
            &by_stage,
            json!({"context": {"x_axis": "Total"}}),
            "velocity",
            doc("velocity", json!({})),
        );
        assert!(!out.filter.contains_key(LEAD_TIME_STAGE_FILTER_KEY));
        assert_eq!(out.across.as_deref(), Some("values"));
    }

    #[test]
    fn test_unresolved_moves_last() {
        let out = run_pass(
            unresolved_last,
            &tickets(),
            json!({}),
            "resolution",
            doc("resolution", json!({"resolutions": ["UNRESOLVED", "Done"]})),
        );
        assert_eq!(out.filter["resolutions"], json!(["Done", ""]));
    }

    #[test]
    fn test_azure_priorities_use_order() {
        let descriptor = ReportDescriptor::builder("azure_tickets_report", "azure_devops")
            .family(ReportFamily::IssueManagement)
            .build();
        let out = run_pass(
            azure_priorities,
            &descriptor,
            json!({"context": {"application": "azure_devops"}}),
            "priority",
            doc("priority", json!({"workitem_priorities": ["High", "", "P9"]})),
        );
        assert_eq!(out.filter["workitem_priorities"], json!(["2", "P9"]));
    }

    #[test]
    fn test_active_sprint_swap() {
        let out = run_pass(
            active_sprint_swap,
            &tickets(),
            json!({"context": {"application": "jira_velocity"}}),
            "status",
            doc("status", json!({"sprint_states": ["active"]})),
        );
        assert_eq!(Value::Object(out.filter), json!({"jira_active_sprint_type": ["active"]}));

        let out = run_pass(
            active_sprint_swap,
            &tickets(),
            json!({"context": {"application": "jira"}}),
            "status",
            doc("status", json!({"jira_active_sprint_type": ["closed"]})),
        );
        assert_eq!(Value::Object(out.filter), json!({"sprint_states": ["closed"]}));
    }

    #[test]
    fn test_azure_custom_fields_drop_prefix() {
        let descriptor = ReportDescriptor::builder("azure_tickets_report", "azure_devops")
            .family(ReportFamily::IssueManagement)
            .build();
        let fields = json!([{"field_key": "Custom.Severity", "metadata": {"transformed": "Severity"}}]);
        let filter = json!({"workitem_custom_fields": {"Custom.Severity": ["1"]}});

        let out = run_pass(
            azure_custom_fields,
            &descriptor,
            json!({"context": {"application": "azure_devops", "supportedCustomFields": fields}}),
            "status",
            doc("status", filter.clone()),
        );
        assert_eq!(out.filter["workitem_custom_fields"], json!({"Severity": ["1"]}));

        let dora = ReportDescriptor::builder("dora_lead_time_for_change", "any").build();
        let out = run_pass(
            azure_custom_fields,
            &dora,
            json!({"context": {
                "application": "any",
                "doraProfileIntegrationType": "IM_ADO",
                "supportedCustomFields": fields
            }}),
            "status",
            doc("status", filter.clone()),
        );
        assert_eq!(out.filter["workitem_custom_fields"], json!({"Severity": ["1"]}));

        let out = run_pass(
            azure_custom_fields,
            &dora,
            json!({"context": {"application": "any", "supportedCustomFields": fields}}),
            "status",
            doc("status", filter.clone()),
        );
        assert_eq!(out.filter["workitem_custom_fields"], filter["workitem_custom_fields"]);
    }

    #[test]
    fn test_custom_stacks() {
        let descriptor = ReportDescriptor::builder("azure_tickets_report", "azure_devops")
            .family(ReportFamily::IssueManagement)
            .build();
        let mut input = doc("status", json!({"custom_stacks": ["Custom.Team"]}));
        input.extra.insert("stacks".into(), json!(["custom_field_stack_flag"]));
        let out = run_pass(custom_stacks, &descriptor, json!({}), "status", input);
        assert_eq!(out.extra["stacks"], json!(["Custom.Team"]));
        assert!(!out.filter.contains_key("custom_stacks"));

        let mut input = doc("status", json!({"custom_stacks": []}));
        input.extra.insert("stacks".into(), json!(["custom_field_stack_flag"]));
        let out = run_pass(custom_stacks, &descriptor, json!({}), "status", input);
        assert!(!out.extra.contains_key("stacks"));
        assert!(!out.filter.contains_key("custom_stacks"));
    }

    #[test]
    fn test_interval_moves_to_top_level() {
        let descriptor = ReportDescriptor::builder("scm_issues_time_across_stages_report", "github")
            .interval_in_payload()
            .build();
        let out = run_pass(
            interval,
            &descriptor,
            json!({}),
            "trend",
            doc("trend", json!({"interval": "week"})),
        );
        assert_eq!(out.interval, Some(json!("week")));
        assert!(!out.filter.contains_key("interval"));

        let mut input = doc("trend", json!({"interval": "week"}));
        input.interval = Some(json!("week"));
        let out = run_pass(interval, &tickets(), json!({}), "trend", input);
        assert_eq!(out.interval, None);
        assert!(!out.filter.contains_key("interval"));
    }

    #[test]
    fn test_sprint_distribution_keys_from_serialized_point() {
        let descriptor = ReportDescriptor::builder("sprint_distribution_retrospective_report", "jira")
            .family(ReportFamily::SprintDistribution)
            .build();
        let out = run_pass(
            sprint_distribution_keys,
            &descriptor,
            json!({"context": {"x_axis": "{\"keys\": [\"LEV-1\", \"LEV-2\"]}"}}),
            "sprint",
            doc("sprint", json!({})),
        );
        assert_eq!(out.filter["keys"], json!(["LEV-1", "LEV-2"]));
    }

    #[test]
    fn test_drop_sort_and_teams() {
        let out = run_pass(
            drop_sort_and_teams,
            &tickets(),
            json!({}),
            "status",
            doc("status", json!({"sort": [{"id": "x"}], "teams": ["a"], "statuses": ["NEW"]})),
        );
        assert_eq!(Value::Object(out.filter), json!({"statuses": ["NEW"]}));
    }
}
