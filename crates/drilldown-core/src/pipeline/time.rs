//! Passes that turn a clicked time bucket into a range filter

use super::PassContext;
use crate::constants::{
    AZURE_TIME_FILTER_KEYS, CUSTOM_FIELD_PREFIX, GROUP_BY_TIME_FILTERS, IGNORE_X_AXIS_KEYS,
    PAGERDUTY_RESPONSE_REPORT, PAGERDUTY_TIME_FILTER_KEYS, PR_ACROSS_VALUES, SCM_PRS_TIME_FILTER_KEYS,
    SCM_REWORK_REPORT, TICKETS_REPORT,
};
use crate::dates::{self, DateRange, Interval, WeekFormat};
use crate::json::{as_i64, is_empty_value, object_entry, range_value, scalar_string};
use crate::registry::ReportFamily;
use crate::types::{FilterDocument, XAxis};
use chrono::Days;
use serde_json::Value;

const NO_UPDATE_DASHBOARD_TIME: &str = "no_update_dashboard_time";
const DEFAULT_DASHBOARD_RANGE: &str = "last_30_days";
const DAY: i64 = 86_400;

/// An x-axis built from an arbitrary JSON value
fn axis_of(value: &Value) -> XAxis {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// The dashboard's time range as `{$gt, $lt}`, resolving relative names
fn dashboard_range(range: Option<&Value>, now: Option<i64>) -> Option<Value> {
    match range {
        Some(Value::Object(bounds)) => {
            let gt = bounds.get("$gt").and_then(scalar_string)?;
            let lt = bounds.get("$lt").and_then(scalar_string)?;
            let mut out = serde_json::Map::new();
            out.insert("$gt".to_string(), Value::String(gt));
            out.insert("$lt".to_string(), Value::String(lt));
            Some(Value::Object(out))
        }
        Some(Value::String(name)) => relative_range(name, now?),
        None => relative_range(DEFAULT_DASHBOARD_RANGE, now?),
        _ => None,
    }
}

/// `last_N_days` ending with today
fn relative_range(name: &str, now: i64) -> Option<Value> {
    let days: i64 = name
        .strip_prefix("last_")?
        .strip_suffix("_days")?
        .parse()
        .ok()?;
    let today = dates::bucket_at(now, Interval::Day)?;
    let from = days.checked_mul(DAY).and_then(|span| today.from.checked_sub(span))?;
    Some(range_value(from, today.to))
}

/// Widget time filters that follow the dashboard's time range
pub(super) fn dashboard_time(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let pinned = doc
        .filter
        .get(NO_UPDATE_DASHBOARD_TIME)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if pinned {
        return doc;
    }
    let Some(Value::Object(time_keys)) = ctx.request.metadata.get("dashBoard_time_keys") else {
        return doc;
    };
    let keys: Vec<&String> = time_keys
        .iter()
        .filter(|(_, config)| {
            config
                .get("use_dashboard_time")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .map(|(key, _)| key)
        .filter(|key| !(key.as_str() == ctx.across && ctx.across.starts_with(CUSTOM_FIELD_PREFIX)))
        .collect();
    if keys.is_empty() {
        return doc;
    }
    let Some(range) = dashboard_range(
        ctx.request.dashboard_metadata.dashboard_time_range_filter.as_ref(),
        ctx.request.now,
    ) else {
        return doc;
    };

    for key in keys {
        if key.contains(CUSTOM_FIELD_PREFIX) {
            object_entry(&mut doc.filter, "custom_fields").insert(key.clone(), range.clone());
        } else {
            doc.filter.insert(key.clone(), range.clone());
        }
    }
    doc
}

/// SCM PR reports grouped by a PR time
pub(super) fn scm_pr_across(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::ScmPrs) || !SCM_PRS_TIME_FILTER_KEYS.contains(&ctx.across) {
        return doc;
    }
    let key = format!("{}_at", ctx.across);
    let interval = ctx.filter_interval(&doc);
    if let Some(range) = dates::derive_range(ctx.x_axis(), interval, WeekFormat::Date) {
        let range = range.narrow(doc.filter.get(&key));
        doc.filter.insert(key, range.to_value());
    }
    doc
}

fn is_bucketed_across(across: &str) -> bool {
    across == "ticket_created"
        || GROUP_BY_TIME_FILTERS.contains(&across)
        || AZURE_TIME_FILTER_KEYS.contains(&across)
        || SCM_PRS_TIME_FILTER_KEYS.contains(&across)
        || PAGERDUTY_TIME_FILTER_KEYS.contains(&across)
}

/// Ticket reports bucketed by created/updated/resolved/due time
pub(super) fn time_bucketed_tickets(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let across = ctx.across;
    let x_axis = ctx.x_axis();
    let ignored = x_axis
        .label()
        .is_some_and(|label| IGNORE_X_AXIS_KEYS.contains(&label.as_str()));
    if !ctx.descriptor.has_family(ReportFamily::TimeBucketedTickets) || !is_bucketed_across(across) || ignored {
        return doc;
    }
    let Some(derived) = dates::derive_range(x_axis, ctx.filter_interval(&doc), ctx.week_format()) else {
        return doc;
    };

    let report = ctx.report_type();
    let dependency_analysis = report == TICKETS_REPORT
        && doc
            .filter
            .get("links")
            .and_then(Value::as_array)
            .is_some_and(|links| !links.is_empty());

    let existing_key = format!("{}_at", across.replacen("_at", "", 1));
    let range = if dependency_analysis {
        derived
    } else {
        derived.narrow(doc.filter.get(&existing_key))
    };

    let key = if report == "zendesk_tickets_report" {
        "created_at".to_string()
    } else if report == PAGERDUTY_RESPONSE_REPORT || ctx.descriptor.is_azure() {
        across.to_string()
    } else {
        format!("{across}_at")
    };
    let value = if report == TICKETS_REPORT && key == "issue_due_at" {
        range.to_inclusive_value()
    } else {
        range.to_value()
    };
    doc.filter.insert(key.clone(), value.clone());

    if dependency_analysis {
        if let Some(own) = ctx.request.widget.query.get(&key) {
            doc.filter.insert(key.clone(), own.clone());
        }
        doc.filter.insert(format!("linked_{across}_at"), value);
        doc.filter.remove(&format!("linked_{across}"));
    }
    doc
}

/// Stage bounce reports: the clicked stage plus the clicked bucket or value
pub(super) fn stage_bounce(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::StageBounce) {
        return doc;
    }
    let azure = ctx.descriptor.is_azure();
    let x_axis = match ctx.x_axis().point().and_then(|p| p.get("value")) {
        Some(value) => axis_of(value),
        None => ctx.x_axis().clone(),
    };
    let stage = ctx
        .x_axis()
        .point()
        .and_then(|p| p.get("stage"))
        .filter(|s| !is_empty_value(s))
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    let stage_key = if azure { "workitem_stages" } else { "stages" };
    let across = ctx.across;

    if GROUP_BY_TIME_FILTERS.contains(&across) || AZURE_TIME_FILTER_KEYS.contains(&across) {
        let key = if azure { across.to_string() } else { format!("{across}_at") };
        let Some(range) = dates::derive_range(&x_axis, ctx.filter_interval(&doc), WeekFormat::Date) else {
            return doc;
        };
        let range = range.narrow(doc.filter.get(&key));
        doc.filter.insert(stage_key.to_string(), stage);
        doc.filter.insert(key, range.to_value());
    } else {
        // A point's `value` wins over its `id`
        let point = ctx.x_axis().point();
        let clicked = match point.and_then(|p| p.get("id")) {
            Some(id) if point.and_then(|p| p.get("value")).is_none() => id.clone(),
            _ => x_axis.to_value(),
        };
        doc.filter.insert(stage_key.to_string(), stage);
        doc.filter
            .insert(crate::across::filter_key(across, ctx.descriptor), Value::Array(vec![clicked]));
    }
    doc
}

/// Commit trends filter on `committed_at`; weeks are always ISO weeks
pub(super) fn commits_trend(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::CommitsTrend) || ctx.across != "trend" {
        return doc;
    }
    let interval_name = if ctx.report_type() == SCM_REWORK_REPORT {
        doc.filter.get("interval").and_then(Value::as_str)
    } else {
        doc.interval.as_ref().and_then(Value::as_str)
    };
    let interval = Interval::from_filter(interval_name, true);
    if let Some(range) = dates::derive_range(ctx.x_axis(), interval, ctx.week_format()) {
        let range = range.narrow(doc.filter.get("committed_at"));
        doc.filter.insert("committed_at".to_string(), range.to_value());
    }
    doc
}

/// PR trends: the lower bound respects the widget's own range, the upper does not
pub(super) fn pr_trend(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let across = ctx.across;
    if !ctx.descriptor.has_family(ReportFamily::GithubPrsTrend) || !PR_ACROSS_VALUES.contains(&across) {
        return doc;
    }
    let key = format!("{across}_at");
    if let Some(range) = dates::derive_range(ctx.x_axis(), ctx.filter_interval(&doc), WeekFormat::Date) {
        let range = range.narrow_from(doc.filter.get(&key));
        doc.filter.remove(across);
        doc.filter.insert(key, range.to_value());
    }
    doc
}

/// CICD job reports grouped by job end time
pub(super) fn cicd_end_time(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::ScmCicd) || !matches!(ctx.across, "job_end" | "trend") {
        return doc;
    }
    let interval = Interval::from_filter(doc.filter.get("interval").and_then(Value::as_str), false);
    if let Some(range) = dates::derive_range(ctx.x_axis(), interval, WeekFormat::Date) {
        doc.filter.insert("end_time".to_string(), range.to_value());
    }
    doc
}

/// Sprint metric trends grouped by period filter on sprint completion
pub(super) fn sprint_trend_completed_at(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::SprintMetricsTrend) {
        return doc;
    }
    let interval = match ctx.across {
        "week" | "bi_week" => Interval::IsoWeek,
        "month" => Interval::Month,
        _ => return doc,
    };
    // Sprint trend points carry milliseconds
    let anchor = match ctx.x_axis() {
        XAxis::Epoch(ms) if *ms > 100_000_000_000 => XAxis::Epoch(ms / 1000),
        other => other.clone(),
    };
    let Some(date) = dates::parse_loose_anchor(&anchor) else {
        return doc;
    };
    let Some(mut range) = dates::bucket(date, interval) else {
        return doc;
    };
    if ctx.across == "bi_week" {
        let Some(next) = date
            .checked_add_days(Days::new(7))
            .and_then(|next| dates::bucket(next, interval))
        else {
            return doc;
        };
        range.to = next.to;
    }
    doc.filter.insert("completed_at".to_string(), range.to_value());
    doc
}

/// Map a code-volume interval name onto a bucket width
fn code_volume_interval(name: &str, week_starts_on_monday: bool) -> Option<Interval> {
    match name {
        "weekly" | "week" if week_starts_on_monday => Some(Interval::IsoWeek),
        "weekly" | "week" => Some(Interval::Week),
        "bi-weekly" | "biweekly" => Some(Interval::BiWeek),
        "monthly" | "month" => Some(Interval::Month),
        _ => None,
    }
}

fn code_volume_interval_name(name: &str) -> Option<&'static str> {
    match name {
        "weekly" | "week" => Some("week"),
        "bi-weekly" | "biweekly" => Some("biweekly"),
        "monthly" | "month" => Some("month"),
        _ => None,
    }
}

/// Code volume vs deployment: the clicked point's id starts the bucket
pub(super) fn code_volume_end_time(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::CodeVolume) {
        return doc;
    }
    doc.filter.remove("job_end");

    if let Some(Value::String(name)) = &doc.interval {
        if let Some(mapped) = code_volume_interval_name(name) {
            doc.interval = Some(Value::String(mapped.to_string()));
        }
    }

    let Some(gt) = ctx
        .x_axis()
        .point_lenient()
        .and_then(|p| p.get("id").and_then(as_i64))
    else {
        return doc;
    };
    let name = ctx.interval.and_then(Value::as_str).unwrap_or_default();
    let lt = match code_volume_interval(name, ctx.descriptor.week_starts_on_monday) {
        Some(Interval::BiWeek) => gt
            .checked_add(7 * DAY)
            .and_then(|next| dates::bucket_at(next, Interval::IsoWeek))
            .map(|r| r.to),
        Some(interval) => dates::bucket_at(gt, interval).map(|r| r.to),
        None => dates::bucket_at(gt, Interval::Day).map(|r| r.to),
    };
    if let Some(lt) = lt {
        doc.filter.insert("end_time".to_string(), DateRange { from: gt, to: lt }.to_value());
    }
    doc
}

/// Drop a `committed_at` range missing either bound
pub(super) fn committed_at_sanitize(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::CommitsTrend) || ctx.report_type() == SCM_REWORK_REPORT {
        return doc;
    }
    if let Some(range) = doc.filter.get("committed_at") {
        let (gt, lt) = dates::existing_bounds(range);
        if gt.is_none() || lt.is_none() {
            doc.filter.remove("committed_at");
        }
    }
    doc
}

/// Testrails trends filter on the creation day of the counted entity
pub(super) fn testrails_trend(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::TestrailsTrend) || ctx.x_axis().is_missing() {
        return doc;
    }
    let key = match doc.filter.get("metric").and_then(Value::as_str) {
        Some("test_case_count") => "created_on",
        Some("test_count") => "created_at",
        _ => return doc,
    };
    if let Some(range) = dates::day_range(ctx.x_axis()) {
        doc.filter.insert(key.to_string(), range.to_value());
    }
    doc
}
