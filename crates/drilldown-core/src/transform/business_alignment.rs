//! Effort-investment (business alignment) transforms
//!
//! Both reports are built on the jira transform. The widget query carries
//! several keys that only configure the chart, such as the active work unit
//! or the completed-work statuses; these are translated into real filters
//! and then dropped.

use super::issue_management::jira;
use super::{TransformInput, TransformOutput};
use crate::constants::business_alignment as ba;
use crate::dates::{self, DateRange, Interval, WeekFormat};
use crate::json::{is_empty_value, sanitized, scalar_string, FilterMap};
use crate::types::XAxis;
use serde_json::Value;

const NO_UPDATE_MARKERS: [&str; 2] = ["no_update_time_field", "no_update_dashboard_time"];

fn is_azure(input: &TransformInput<'_>) -> bool {
    input.application() == "azure_devops"
}

fn apply_profile(filter: &mut FilterMap, input: &TransformInput<'_>) {
    let dashboard = input.dashboard_metadata;
    if dashboard.effort_investment_profile {
        filter.insert(
            ba::CATEGORIZATION_SCHEME.to_string(),
            dashboard
                .effort_investment_profile_filter
                .clone()
                .unwrap_or(Value::Null),
        );
    }
}

fn unset(filter: &mut FilterMap, keys: &[String]) {
    for key in keys {
        filter.remove(key);
    }
}

/// Range covered by a trend column starting at `start_date`
fn column_range(start_date: &str, interval: &str, now: Option<i64>) -> Option<DateRange> {
    let range = match interval {
        "month" => dates::derive_range(
            &XAxis::Label(start_date.to_string()),
            Interval::Month,
            WeekFormat::Date,
        )?,
        "week" => {
            let from = dates::parse_day_label(start_date)?;
            DateRange {
                from,
                to: dates::bucket_at(from, Interval::IsoWeek)?.to,
            }
        }
        "bi_week" => {
            let from = dates::parse_day_label(start_date)?;
            DateRange {
                from,
                to: from.checked_add(14 * 86_400)?,
            }
        }
        "quarter" => {
            let from = dates::parse_day_label(start_date)?;
            DateRange {
                from,
                to: dates::bucket_at(from, Interval::Quarter)?.to,
            }
        }
        _ => return None,
    };
    let cap = now.and_then(dates::end_of_day);
    let to = cap.map_or(range.to, |cap| range.to.min(cap));
    // A column that starts after today collapses onto the cap
    Some(DateRange {
        from: range.from.min(to),
        to,
    })
}

/// A click on one category of one period of the effort-investment trend
pub fn effort_investment_trend(input: &TransformInput<'_>) -> TransformOutput {
    let TransformOutput {
        across_value,
        mut filters,
    } = jira(input);
    let point = input.context.x_axis.point_lenient().unwrap_or_default();
    let start_date = point.get("start_date").and_then(Value::as_str);
    let data_key_clicked = point.get("dataKeyClicked").and_then(scalar_string);

    let mut keys_to_unset: Vec<String> = [
        "across",
        ba::TIME_RANGE,
        ba::ACTIVE_WORK_UNIT,
        "committed_at",
        "interval",
        ba::COMPLETED_WORK_STATUS,
        ba::IN_PROGRESS_STATUS,
    ]
    .iter()
    .map(|k| k.to_string())
    .collect();

    let mut filter = std::mem::take(&mut filters.filter);
    if is_azure(input) {
        filter.insert(
            "workitem_status_categories".to_string(),
            Value::from(ba::AZURE_COMPLETED_STATUS_CATEGORIES.to_vec()),
        );
        let scheme = filter
            .get(ba::CATEGORIZATION_SCHEME)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        filter.insert("workitem_ticket_categorization_scheme".to_string(), scheme);
        keys_to_unset.push(ba::CATEGORIZATION_SCHEME.to_string());
        keys_to_unset.push(ba::CATEGORIZATION_SCHEME_CATEGORY.to_string());
    } else {
        match filter.get(ba::COMPLETED_WORK_STATUS).cloned() {
            Some(statuses) if !is_empty_value(&statuses) => {
                filter.insert("statuses".to_string(), statuses);
            }
            _ => {
                filter.insert("status_categories".to_string(), Value::from(vec!["Done"]));
            }
        }
        filter = sanitized(&filter);
    }

    let interval = filter
        .get("interval")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if let Some(range) = start_date.and_then(|start| column_range(start, &interval, input.now)) {
        filter.insert(across_value.clone(), range.to_value());
    }

    apply_profile(&mut filter, input);
    unset(&mut filter, &keys_to_unset);
    for marker in NO_UPDATE_MARKERS {
        filter.insert(marker.to_string(), Value::Bool(true));
    }

    if let Some(category) = data_key_clicked {
        let key = if is_azure(input) {
            "workitem_ticket_categories"
        } else {
            "ticket_categories"
        };
        filter.insert(key.to_string(), Value::from(vec![category]));
    }

    filters.filter = filter;
    TransformOutput {
        across_value,
        filters,
    }
}

/// A click on one engineer of the engineer allocation table
pub fn effort_investment_engineer(input: &TransformInput<'_>) -> TransformOutput {
    let TransformOutput {
        mut across_value,
        mut filters,
    } = jira(input);
    let current_allocation = input
        .context
        .extra
        .get(input.application())
        .and_then(|data| data.pointer("/additional_data/current_allocation"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut filter = std::mem::take(&mut filters.filter);
    let mut keys_to_unset: Vec<String> = [
        "across",
        ba::TIME_RANGE,
        ba::ACTIVE_WORK_UNIT,
        "interval",
        "completed_at",
        ba::COMPLETED_WORK_STATUS,
        ba::IN_PROGRESS_STATUS,
        ba::HISTORICAL_ASSIGNEES_STATUSES,
        ba::CATEGORIZATION_UNIT,
    ]
    .iter()
    .map(|k| k.to_string())
    .collect();
    keys_to_unset.push(input.across_key());

    let engineer_key = if filter.get(ba::URI_UNIT).and_then(Value::as_str) == Some(ba::COMMIT_COUNT_FTE) {
        keys_to_unset.push("issue_resolved_at".to_string());
        keys_to_unset.push(ba::EFFORT_ATTRIBUTION.to_string());
        if !current_allocation {
            across_value = "author".to_string();
        }
        "author"
    } else {
        keys_to_unset.push("committed_at".to_string());
        if filter.get(ba::ATTRIBUTION_MODE).and_then(Value::as_str)
            == Some(ba::CURRENT_AND_PREVIOUS_ASSIGNEES)
        {
            "historical_assignees"
        } else {
            "assignee_display_names"
        }
    };
    // The key may coincide with the clicked across key, so unset first
    unset(&mut filter, &keys_to_unset);
    keys_to_unset.retain(|key| key != engineer_key);
    filter.insert(
        engineer_key.to_string(),
        Value::Array(vec![input.context.x_axis.to_value()]),
    );

    if current_allocation {
        keys_to_unset.push(ba::EFFORT_ATTRIBUTION.to_string());
    } else {
        filter.insert("status_categories".to_string(), Value::from(vec!["Done"]));
        filter = sanitized(&filter);
    }

    let completed = input.widget.query.get(ba::COMPLETED_WORK_STATUS).cloned();
    let in_progress = input.widget.query.get(ba::IN_PROGRESS_STATUS).cloned();
    if current_allocation {
        if let Some(in_progress) = &in_progress {
            let mut statuses = completed.as_ref().map(list).unwrap_or_default();
            statuses.extend(list(in_progress));
            filter.insert("statuses".to_string(), Value::Array(statuses));
            filter = sanitized(&filter);
        }
    }
    if let Some(completed) = completed {
        filter.insert("statuses".to_string(), Value::Array(list(&completed)));
        filter = sanitized(&filter);
        keys_to_unset.push("status_categories".to_string());
    }

    apply_profile(&mut filter, input);
    unset(&mut filter, &keys_to_unset);

    filters.filter = filter;
    TransformOutput {
        across_value,
        filters,
    }
}

fn list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::run;
    use super::super::TransformKind;
    use crate::registry::{ReportDescriptor, ReportFamily};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn trend() -> ReportDescriptor {
        ReportDescriptor::builder("effort_investment_trend_report", "jira")
            .family(ReportFamily::BusinessAlignment)
            .transform(TransformKind::EffortInvestmentTrend)
            .build()
    }

    fn engineer() -> ReportDescriptor {
        ReportDescriptor::builder("effort_investment_engineer_report", "jira")
            .family(ReportFamily::BusinessAlignment)
            .transform(TransformKind::EffortInvestmentEngineer)
            .build()
    }

    #[test]
    fn test_trend_month_column() {
        let out = run(
            TransformKind::EffortInvestmentTrend,
            &trend(),
            json!({
                "context": {
                    "application": "jira",
                    "x_axis": {"start_date": "Jan 2024", "dataKeyClicked": "Features"}
                },
                "widget": {"query": {
                    "across": "issue_resolved_at",
                    "interval": "month",
                    "ba_time_range": {"$gt": "1"},
                    "active_work_unit": "tickets_report",
                    "completed_work_status": ["DONE"],
                    "ticket_categorization_unit": "story_points"
                }},
                "dashboard_metadata": {"effort_investment_profile": true, "effort_investment_profile_filter": "scheme-1"}
            }),
        );
        assert_eq!(out.across_value, "issue_resolved_at");
        assert_eq!(
            Value::Object(out.filters.filter),
            json!({
                "statuses": ["DONE"],
                "issue_resolved_at": {"$gt": "1704067200", "$lt": "1706745599"},
                "ticket_categorization_scheme": "scheme-1",
                "no_update_time_field": true,
                "no_update_dashboard_time": true,
                "ticket_categories": ["Features"]
            })
        );
    }

    #[test]
    fn test_trend_caps_at_end_of_today() {
        let out = run(
            TransformKind::EffortInvestmentTrend,
            &trend(),
            json!({
                "context": {"application": "jira", "x_axis": {"start_date": "15 Jan 2024"}},
                "widget": {"query": {"across": "issue_resolved_at", "interval": "quarter"}},
                "now": 1_705_400_000
            }),
        );
        let filter = out.filters.filter;
        assert_eq!(filter["status_categories"], json!(["Done"]));
        assert_eq!(
            filter["issue_resolved_at"],
            json!({"$gt": "1705276800", "$lt": "1705449599"})
        );
    }

    #[test]
    fn test_trend_future_column_never_inverts() {
        let out = run(
            TransformKind::EffortInvestmentTrend,
            &trend(),
            json!({
                "context": {"application": "jira", "x_axis": {"start_date": "01 Feb 2024"}},
                "widget": {"query": {"across": "issue_resolved_at", "interval": "week"}},
                "now": 1_705_400_000
            }),
        );
        assert_eq!(
            out.filters.filter["issue_resolved_at"],
            json!({"$gt": "1705449599", "$lt": "1705449599"})
        );
    }

    #[test]
    fn test_trend_azure_categories() {
        let out = run(
            TransformKind::EffortInvestmentTrend,
            &trend(),
            json!({
                "context": {"application": "azure_devops", "x_axis": {"start_date": "15 Jan 2024", "dataKeyClicked": "Bugs"}},
                "widget": {"query": {"across": "workitem_resolved_at", "interval": "bi_week", "ticket_categorization_scheme": "s-9"}}
            }),
        );
        let filter = out.filters.filter;
        assert_eq!(filter["workitem_status_categories"], json!(["Completed", "Resolved"]));
        assert_eq!(filter["workitem_ticket_categorization_scheme"], json!("s-9"));
        assert_eq!(filter["workitem_ticket_categories"], json!(["Bugs"]));
        assert_eq!(
            filter["workitem_resolved_at"],
            json!({"$gt": "1705276800", "$lt": "1706486400"})
        );
        assert!(!filter.contains_key("ticket_categorization_scheme"));
    }

    #[test]
    fn test_engineer_assignee() {
        let out = run(
            TransformKind::EffortInvestmentEngineer,
            &engineer(),
            json!({
                "context": {"application": "jira", "x_axis": "Ann"},
                "widget": {"query": {"across": "assignee", "interval": "week", "committed_at": {"$gt": "1"}}}
            }),
        );
        assert_eq!(out.across_value, "assignee");
        assert_eq!(
            Value::Object(out.filters.filter),
            json!({"assignee_display_names": ["Ann"], "status_categories": ["Done"]})
        );
    }

    #[test]
    fn test_engineer_commit_fte_current_allocation() {
        let out = run(
            TransformKind::EffortInvestmentEngineer,
            &engineer(),
            json!({
                "context": {
                    "application": "jira",
                    "x_axis": "dev@example.com",
                    "jira": {"additional_data": {"current_allocation": true}}
                },
                "widget": {"query": {
                    "across": "assignee",
                    "uri_unit": "commit_count_fte",
                    "ba_effort_attribution": "current_assignee",
                    "completed_work_status": ["Done"],
                    "in_progress_status": ["In Progress"]
                }}
            }),
        );
        assert_eq!(out.across_value, "assignee");
        let filter = out.filters.filter;
        assert_eq!(filter["author"], json!(["dev@example.com"]));
        assert_eq!(filter["statuses"], json!(["Done"]));
        assert!(!filter.contains_key("ba_effort_attribution"));
        assert!(!filter.contains_key("status_categories"));
    }

    #[test]
    fn test_engineer_historical_assignees() {
        let out = run(
            TransformKind::EffortInvestmentEngineer,
            &engineer(),
            json!({
                "context": {"application": "jira", "x_axis": "Ann"},
                "widget": {"query": {"across": "assignee", "ba_attribution_mode": "current_and_previous_assignees"}}
            }),
        );
        assert_eq!(out.filters.filter["historical_assignees"], json!(["Ann"]));
    }
}
