use super::generic::generic;
use super::{TransformInput, TransformOutput};
use serde_json::Value;

/// Per-sprint metric trend; the metric and period keys only drive the chart
pub fn sprint_metric_trend(input: &TransformInput<'_>) -> TransformOutput {
    let mut out = generic(input);
    let filter = &mut out.filters.filter;
    for key in ["metric", "week", "month", "bi_week", "sprint"] {
        filter.remove(key);
    }

    if out.across_value == "sprint" {
        // sprint_report replaces the clicked sprint key
        filter.remove(&input.across_key());
        if !input.context.x_axis.is_missing() {
            filter.insert(
                "sprint_report".to_string(),
                Value::Array(vec![input.context.x_axis.to_value()]),
            );
            filter.insert("include_issue_keys".to_string(), Value::Bool(true));
            filter.insert("include_workitem_ids".to_string(), Value::Bool(true));
        }
    } else {
        filter.insert("include_total_count".to_string(), Value::Bool(true));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::run;
    use super::super::TransformKind;
    use crate::registry::ReportDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn descriptor() -> ReportDescriptor {
        ReportDescriptor::builder("sprint_metrics_trend", "jira").build()
    }

    #[test]
    fn test_sprint_across_selects_report() {
        let out = run(
            TransformKind::SprintMetricTrend,
            &descriptor(),
            json!({
                "context": {"application": "jira", "x_axis": "Sprint 12"},
                "widget": {"query": {"across": "sprint", "metric": ["velocity"], "sprint": "Sprint", "projects": ["P"]}}
            }),
        );
        assert_eq!(
            Value::Object(out.filters.filter),
            json!({
                "projects": ["P"],
                "sprint_report": ["Sprint 12"],
                "include_issue_keys": true,
                "include_workitem_ids": true
            })
        );
    }

    #[test]
    fn test_period_across_counts_totals() {
        let out = run(
            TransformKind::SprintMetricTrend,
            &descriptor(),
            json!({
                "context": {"application": "jira", "x_axis": "15 Jan 2024"},
                "widget": {"query": {"across": "week", "week": true}}
            }),
        );
        assert_eq!(Value::Object(out.filters.filter), json!({"include_total_count": true}));
    }
}
