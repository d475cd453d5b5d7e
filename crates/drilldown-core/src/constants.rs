//! Key tables shared by the passes

/// Sentinel written for the unassigned bucket
pub const UNASSIGNED: &str = "_UNASSIGNED_";

/// X-axis values that never narrow a time range
pub const IGNORE_X_AXIS_KEYS: &[&str] = &[UNASSIGNED, "Total"];

pub const CUSTOM_FIELD_PREFIX: &str = "customfield_";
pub const AZURE_CUSTOM_FIELD_PREFIX: &str = "Custom.";
pub const AZURE_CUSTOM_FIELDS_KEY: &str = "workitem_custom_fields";
pub const CUSTOM_FIELD_STACK_FLAG: &str = "custom_field_stack_flag";

pub const PARTIAL_MATCH_KEY: &str = "partial_match";
pub const LEAD_TIME_STAGE_FILTER_KEY: &str = "histogram_stage_name";
pub const ACTIVE_SPRINT_TYPE_FILTER_KEY: &str = "jira_active_sprint_type";
pub const AZURE_ITERATION_SPRINT_DESIGNATION: &str = "sprint_report";

pub const AZURE_APPLICATION: &str = "azure_devops";
/// DORA profile integration type of an Azure DevOps issue-management profile
pub const IM_ADO_PROFILE: &str = "IM_ADO";

pub const PAGERDUTY_RESPONSE_REPORT: &str = "pagerduty_response_reports";
pub const TICKETS_REPORT: &str = "tickets_report";
pub const AZURE_TICKETS_REPORT: &str = "azure_tickets_report";
pub const SCM_REWORK_REPORT: &str = "scm_rework_report";
pub const LEAD_TIME_BY_TIME_SPENT_IN_STAGES_REPORT: &str =
    "lead_time_by_time_spent_in_stages_report";

/// Reports whose across always comes from the widget query
pub const HYGIENE_ACROSS_REPORTS: &[&str] = &["hygiene_report", "azure_hygiene_report"];

/// Across values of the time-bucketed ticket reports
pub const GROUP_BY_TIME_FILTERS: &[&str] =
    &["issue_created", "issue_updated", "issue_resolved", "issue_due"];

/// Across values the pagerduty and azure variants bucket by
pub const AZURE_TIME_FILTER_KEYS: &[&str] = &[
    "workitem_created_at",
    "workitem_updated_at",
    "workitem_resolved_at",
    "workitem_due_at",
];

pub const PAGERDUTY_TIME_FILTER_KEYS: &[&str] = &[
    "incident_created_at",
    "incident_resolved_at",
    "alert_created_at",
    "alert_resolved_at",
];

/// SCM PR acrosses that narrow `{across}_at`
pub const SCM_PRS_TIME_FILTER_KEYS: &[&str] =
    &["pr_created", "pr_closed", "pr_merged", "pr_updated"];

/// Across values of the PR trend reports
pub const PR_ACROSS_VALUES: &[&str] =
    &["pr_created", "pr_updated", "pr_merged", "pr_reviewed", "pr_closed"];

/// Applications that get the jira OR-query
pub const OR_QUERY_APPLICATIONS: &[&str] = &["githubjira", "jira", "jirazendesk", "jirasalesforce"];

/// Applications the OU composer serves
pub const OU_SUPPORTED_APPLICATIONS: &[&str] = &[
    "jira",
    "azure_devops",
    "github",
    "githubjira",
    "jenkins",
    "jenkinsgithub",
    "pagerduty",
    "zendesk",
    "salesforce",
    "testrails",
    "any",
    "jira_velocity",
];

/// Integrations a github-based lead-time widget may draw on
pub const GITHUB_APPLICATIONS: &[&str] = &[
    "github",
    "azure_devops",
    "gitlab",
    "bitbucket",
    "bitbucket_server",
    "helix",
    "gerrit",
];

/// Widget-level sort, never part of a drill-down filter
pub const SORT_FILTER_KEY: &str = "sort";

/// Applications that inject a sprint OU designation
pub const OU_SPRINT_APPLICATIONS: &[&str] = &["jira", "azure_devops", "githubjira"];

/// Applications of the lead-time reports that filter integration ids
pub const LEAD_TIME_APPLICATIONS: &[&str] = &["azure_devops", "jira_velocity", "scm_velocity"];

/// Every across that names a time filter; these never become OU exclusions
pub const ALL_TIME_FILTER_KEYS: &[&str] = &[
    "job_end",
    "trend",
    "issue_created",
    "issue_updated",
    "issue_resolved",
    "issue_due",
    "issue_created_at",
    "issue_updated_at",
    "issue_resolved_at",
    "issue_due_at",
    "workitem_created_at",
    "workitem_updated_at",
    "workitem_resolved_at",
    "workitem_due_at",
    "pr_created",
    "pr_updated",
    "pr_merged",
    "pr_reviewed",
    "pr_closed",
    "pr_created_at",
    "pr_updated_at",
    "pr_merged_at",
    "pr_closed_at",
    "committed_at",
    "created_at",
    "incident_created_at",
    "incident_resolved_at",
    "alert_created_at",
    "alert_resolved_at",
    "start_time",
    "end_time",
    "job_started_at",
    "day",
    "week",
    "bi_week",
    "month",
    "quarter",
    "year",
];

/// Global UI dimension to backend filter key table
pub const VALUES_TO_FILTERS: &[(&str, &str)] = &[
    ("assignee", "assignees"),
    ("priority", "priorities"),
    ("status", "statuses"),
    ("issue_type", "issue_types"),
    ("project", "projects"),
    ("component", "components"),
    ("label", "labels"),
    ("reporter", "reporters"),
    ("fix_version", "fix_versions"),
    ("version", "versions"),
    ("resolution", "resolutions"),
    ("status_category", "status_categories"),
    ("epic", "epics"),
    ("repo_id", "repo_ids"),
    ("author", "authors"),
    ("committer", "committers"),
    ("creator", "creators"),
    ("reviewer", "reviewers"),
    ("branch", "branches"),
    ("source_branch", "source_branches"),
    ("target_branch", "target_branches"),
    ("hygiene_type", "hygiene_types"),
    ("sprint", "sprints"),
    ("first_assignee", "first_assignees"),
    ("brand", "brands"),
    ("organization", "organizations"),
    ("requester", "requesters"),
    ("submitter", "submitters"),
    ("job_name", "job_names"),
    ("job_status", "job_statuses"),
    ("cicd_user_id", "cicd_user_ids"),
    ("instance_name", "instance_names"),
    ("service", "pd_service"),
    ("incident_priority", "incident_priorities"),
    ("alert_severity", "alert_severities"),
    ("milestone", "milestones"),
    ("test_plan", "test_plans"),
    ("test_run", "test_runs"),
];

/// Azure priority names to their numeric order
pub const PRIORITY_ORDER: &[(&str, i64)] = &[
    ("HIGHEST", 1),
    ("HIGH", 2),
    ("MEDIUM", 3),
    ("LOW", 4),
    ("LOWEST", 5),
];

/// Keys the business-alignment reports carry for bookkeeping only
pub mod business_alignment {
    pub const TIME_RANGE: &str = "ba_time_range";
    pub const ACTIVE_WORK_UNIT: &str = "active_work_unit";
    pub const COMPLETED_WORK_STATUS: &str = "completed_work_status";
    pub const IN_PROGRESS_STATUS: &str = "in_progress_status";
    pub const HISTORICAL_ASSIGNEES_STATUSES: &str = "historical_assignees_statuses";
    pub const EFFORT_ATTRIBUTION: &str = "ba_effort_attribution";
    pub const CATEGORIZATION_SCHEME: &str = "ticket_categorization_scheme";
    pub const CATEGORIZATION_SCHEME_CATEGORY: &str = "ticket_categorization_scheme_category";
    pub const CATEGORIZATION_UNIT: &str = "ticket_categorization_unit";

    pub const URI_UNIT: &str = "uri_unit";
    pub const ATTRIBUTION_MODE: &str = "ba_attribution_mode";
    pub const COMMIT_COUNT_FTE: &str = "commit_count_fte";

    /// Azure status categories counted as completed work
    pub const AZURE_COMPLETED_STATUS_CATEGORIES: &[&str] = &["Completed", "Resolved"];

    /// Attribution mode that credits both current and previous assignees
    pub const CURRENT_AND_PREVIOUS_ASSIGNEES: &str = "current_and_previous_assignees";
}

/// Global values-to-filters lookup
pub fn values_to_filters(across: &str) -> Option<&'static str> {
    VALUES_TO_FILTERS
        .iter()
        .find(|(ui, _)| *ui == across)
        .map(|(_, key)| *key)
}

pub fn priority_order(name: &str) -> Option<i64> {
    let upper = name.to_ascii_uppercase();
    PRIORITY_ORDER
        .iter()
        .find(|(n, _)| *n == upper)
        .map(|(_, order)| *order)
}

pub fn is_time_filter_key(key: &str) -> bool {
    ALL_TIME_FILTER_KEYS.contains(&key)
}

pub fn is_custom_field_key(key: &str) -> bool {
    key.contains(CUSTOM_FIELD_PREFIX) || key.starts_with(AZURE_CUSTOM_FIELD_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_to_filters() {
        assert_eq!(values_to_filters("status"), Some("statuses"));
        assert_eq!(values_to_filters("unknown_dimension"), None);
    }

    #[test]
    fn test_priority_order_is_case_insensitive() {
        assert_eq!(priority_order("High"), Some(2));
        assert_eq!(priority_order("lowest"), Some(5));
        assert_eq!(priority_order("P0"), None);
    }

    #[test]
    fn test_custom_field_keys() {
        assert!(is_custom_field_key("customfield_10020"));
        assert!(is_custom_field_key("jira_customfield_10020"));
        assert!(is_custom_field_key("Custom.Severity"));
        assert!(!is_custom_field_key("status"));
    }
}
