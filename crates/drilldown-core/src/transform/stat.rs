use super::generic::generic;
use super::{TransformInput, TransformOutput};
use crate::dates::DateRange;
use crate::json::as_i64;
use serde_json::Value;

/// Stat applications that keep their grouping
const ACROSS_KEEPING_APPLICATIONS: &[&str] = &["github_prs_stat", "github_issues_stat"];

/// Application to the time filter its `time_period` applies to
fn time_key(application: &str) -> Option<&'static str> {
    match application {
        "jira_stat" | "github_prs_stat" | "github_commits_stat" | "github_issues_stat" => {
            Some("issue_updated_at")
        }
        "jenkins_github_stat" | "jenkins_github_job_runs_stat" => Some("job_started_at"),
        "jenkins_job_config_stat" => Some("job_config_changed_at"),
        _ => None,
    }
}

/// Single-number widgets; the click opens the last `time_period` days
pub fn stat(input: &TransformInput<'_>) -> TransformOutput {
    let TransformOutput { mut filters, .. } = generic(input);
    let application = input.application();

    if ACROSS_KEEPING_APPLICATIONS.contains(&application) {
        filters.filter.remove(input.across);
    } else {
        filters.filter.remove("across");
        filters.across = None;
    }

    let time_period = filters.filter.get("time_period").and_then(as_i64);
    if let (Some(now), Some(days), Some(key)) = (input.now, time_period, time_key(application)) {
        // A period too long to subtract from `now` leaves the filter as it is
        if let Some(from) = days.checked_mul(86_400).and_then(|span| now.checked_sub(span)) {
            let range = DateRange { from, to: now }.narrow(filters.filter.get(key));
            filters.filter.insert(key.to_string(), range.to_value());
        }
    }

    TransformOutput {
        across_value: filters.across.clone().unwrap_or_default(),
        filters,
    }
}
