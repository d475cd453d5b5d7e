//! Built-in report tables

use super::{ReportDescriptor, ReportDescriptorBuilder, ReportFamily};
use crate::export::TabularKind;
use crate::transform::TransformKind;

/// Backend keys of the azure work-item dimensions
const AZURE_ACROSS_KEYS: &[(&str, &str)] = &[
    ("assignee", "workitem_assignees"),
    ("priority", "workitem_priorities"),
    ("status", "workitem_statuses"),
    ("status_category", "workitem_status_categories"),
    ("project", "workitem_projects"),
    ("workitem_type", "workitem_types"),
    ("reporter", "workitem_reporters"),
    ("label", "workitem_labels"),
    ("fix_version", "workitem_fix_versions"),
    ("version", "workitem_versions"),
    ("epic", "workitem_epics"),
    ("resolution", "workitem_resolutions"),
    ("parent_workitem_id", "workitem_parent_workitem_ids"),
    ("sprint", "workitem_sprint_full_names"),
];

fn jira(report_type: &str) -> ReportDescriptorBuilder {
    ReportDescriptor::builder(report_type, "jira")
}

fn azure(report_type: &str) -> ReportDescriptorBuilder {
    ReportDescriptor::builder(report_type, "azure_devops")
        .across_keys(AZURE_ACROSS_KEYS)
        .custom_fields("workitem_custom_fields", "")
        .family(ReportFamily::IssueManagement)
        .week_starts_on_monday()
        .azure_iteration()
}

fn velocity(report_type: &str, application: &str) -> ReportDescriptorBuilder {
    ReportDescriptor::builder(report_type, application)
        .transform(TransformKind::Generic)
        .custom_fields("jira_custom_fields", "jira_")
        .family(ReportFamily::VelocityProfile)
        .without_across_ou_exclusions()
}

fn scm(report_type: &str) -> ReportDescriptorBuilder {
    ReportDescriptor::builder(report_type, "github")
        .transform(TransformKind::Generic)
        .across_keys(&[("repo_id", "repo_ids"), ("project", "projects"), ("label", "labels")])
}

fn cicd(report_type: &str, application: &str) -> ReportDescriptorBuilder {
    ReportDescriptor::builder(report_type, application)
        .transform(TransformKind::Generic)
        .across_keys(&[("job_name", "job_names"), ("qualified_job_name", "qualified_job_names"), ("project_name", "projects")])
}

fn jira_descriptors() -> Vec<ReportDescriptor> {
    vec![
        jira("tickets_report")
            .transform(TransformKind::Jira)
            .family(ReportFamily::TimeBucketedTickets)
            .unsupported_filter("jira_issue_management_system")
            .build(),
        jira("tickets_report_trends")
            .transform(TransformKind::Jira)
            .compare_x_axis_timestamp()
            .build(),
        jira("resolution_time_report")
            .transform(TransformKind::Jira)
            .family(ReportFamily::TimeBucketedTickets)
            .build(),
        jira("jira_time_across_stages")
            .transform(TransformKind::Jira)
            .interval_in_payload()
            .build(),
        jira("hygiene_report").transform(TransformKind::JiraHygiene).build(),
        jira("hygiene_report_trends")
            .transform(TransformKind::Jira)
            .family(ReportFamily::HygieneTrend)
            .build(),
        jira("jira_bounce_report")
            .transform(TransformKind::JiraBounce)
            .family(ReportFamily::TimeBucketedTickets)
            .build(),
        jira("stage_bounce_report")
            .transform(TransformKind::Jira)
            .family(ReportFamily::StageBounce)
            .build(),
        jira("jira_backlog_trend_report")
            .transform(TransformKind::JiraBacklog)
            .compare_x_axis_timestamp()
            .build(),
        jira("jira_burndown_report").transform(TransformKind::JiraBurndown).build(),
        jira("jira_epic_priority_report")
            .transform(TransformKind::EpicPriority)
            .build(),
        jira("effort_investment_trend_report")
            .transform(TransformKind::EffortInvestmentTrend)
            .family(ReportFamily::BusinessAlignment)
            .build(),
        jira("effort_investment_single_stat")
            .transform(TransformKind::Jira)
            .family(ReportFamily::BusinessAlignment)
            .build(),
        jira("effort_investment_engineer_report")
            .transform(TransformKind::EffortInvestmentEngineer)
            .family(ReportFamily::BusinessAlignment)
            .build(),
        jira("sprint_metrics_trend")
            .transform(TransformKind::SprintMetricTrend)
            .family(ReportFamily::SprintMetricsTrend)
            .build(),
        jira("sprint_metrics_percentage_trend")
            .transform(TransformKind::SprintMetricTrend)
            .family(ReportFamily::SprintMetricsTrend)
            .build(),
        jira("sprint_metrics_single_stat")
            .transform(TransformKind::Generic)
            .family(ReportFamily::SprintSingleStatJira)
            .build(),
        jira("sprint_goal")
            .transform(TransformKind::Generic)
            .family(ReportFamily::SprintGoal)
            .build(),
        jira("sprint_distribution_retrospective_report")
            .transform(TransformKind::Generic)
            .family(ReportFamily::SprintDistribution)
            .rename("sprint", "sprint_names")
            .build(),
        jira("tickets_counts_stat").transform(TransformKind::Stat).build(),
        jira("jira_zendesk_report").build(),
    ]
}

fn azure_descriptors() -> Vec<ReportDescriptor> {
    vec![
        azure("azure_tickets_report")
            .transform(TransformKind::Azure)
            .family(ReportFamily::TimeBucketedTickets)
            .build(),
        azure("azure_tickets_report_trends")
            .transform(TransformKind::Azure)
            .compare_x_axis_timestamp()
            .build(),
        azure("azure_resolution_time_report")
            .transform(TransformKind::Azure)
            .family(ReportFamily::TimeBucketedTickets)
            .build(),
        azure("azure_hygiene_report")
            .transform(TransformKind::AzureHygiene)
            .build(),
        azure("azure_hygiene_report_trends")
            .transform(TransformKind::Azure)
            .family(ReportFamily::HygieneTrend)
            .build(),
        azure("azure_stage_bounce_report")
            .transform(TransformKind::Azure)
            .family(ReportFamily::StageBounce)
            .build(),
        azure("azure_backlog_trend_report")
            .transform(TransformKind::AzureBacklogTrend)
            .compare_x_axis_timestamp()
            .build(),
        azure("azure_effort_investment_trend_report")
            .transform(TransformKind::EffortInvestmentTrend)
            .family(ReportFamily::BusinessAlignment)
            .rename("ticket_categories", "workitem_ticket_categories")
            .build(),
        azure("azure_effort_investment_engineer_report")
            .transform(TransformKind::EffortInvestmentEngineer)
            .family(ReportFamily::BusinessAlignment)
            .build(),
        azure("azure_sprint_metrics_trend")
            .transform(TransformKind::SprintMetricTrend)
            .family(ReportFamily::SprintMetricsTrend)
            .build(),
        azure("azure_sprint_metrics_single_stat")
            .transform(TransformKind::Generic)
            .family(ReportFamily::SprintSingleStatAzure)
            .build(),
        azure("azure_issues_time_across_stages_report")
            .transform(TransformKind::Azure)
            .interval_in_payload()
            .build(),
    ]
}

fn velocity_descriptors() -> Vec<ReportDescriptor> {
    vec![
        velocity("lead_time_by_stage_report", "jira")
            .family(ReportFamily::LeadTimeByStage)
            .tabular(TabularKind::LeadTimeStages)
            .build(),
        velocity("lead_time_by_type_report", "jira").build(),
        velocity("lead_time_trend_report", "jira").build(),
        velocity("lead_time_single_stat", "jira")
            .or_filter_key("jira_or")
            .build(),
        velocity("lead_time_by_time_spent_in_stages_report", "any")
            .custom_fields("custom_fields", "")
            .tabular(TabularKind::LeadTimeStages)
            .build(),
        velocity("azure_lead_time_by_stage_report", "azure_devops")
            .custom_fields("workitem_custom_fields", "")
            .family(ReportFamily::LeadTimeByStage)
            .tabular(TabularKind::LeadTimeStages)
            .build(),
        velocity("azure_lead_time_single_stat", "azure_devops")
            .custom_fields("workitem_custom_fields", "")
            .build(),
    ]
}

fn scm_descriptors() -> Vec<ReportDescriptor> {
    vec![
        scm("github_prs_report").family(ReportFamily::ScmPrs).build(),
        scm("github_prs_report_trends")
            .family(ReportFamily::GithubPrsTrend)
            .build(),
        scm("github_prs_merge_trends")
            .family(ReportFamily::GithubPrsTrend)
            .build(),
        scm("github_prs_first_review_trends")
            .family(ReportFamily::GithubPrsTrend)
            .build(),
        scm("github_commits_report")
            .family(ReportFamily::CommitsTrend)
            .rename("code_change_size_unit", "code_change_size_config")
            .build(),
        scm("scm_rework_report")
            .family(ReportFamily::CommitsTrend)
            .build(),
        scm("scm_files_report").family(ReportFamily::ScmFiles).build(),
        ReportDescriptor::builder("scm_jira_files_report", "githubjira")
            .transform(TransformKind::Generic)
            .family(ReportFamily::ScmFiles)
            .build(),
        scm("scm_issues_time_across_stages_report")
            .interval_in_payload()
            .build(),
        scm("github_prs_single_stat").transform(TransformKind::Stat).build(),
        scm("github_commits_single_stat")
            .transform(TransformKind::Stat)
            .family(ReportFamily::CommitsTrend)
            .build(),
        ReportDescriptor::builder("review_collaboration_report", "github").build(),
    ]
}

fn cicd_descriptors() -> Vec<ReportDescriptor> {
    vec![
        cicd("cicd_scm_jobs_count_report", "jenkinsgithub")
            .family(ReportFamily::ScmCicd)
            .build(),
        cicd("cicd_scm_jobs_duration_report", "jenkinsgithub")
            .family(ReportFamily::ScmCicd)
            .build(),
        cicd("jobs_count_trends_report", "jenkinsgithub")
            .family(ReportFamily::ScmCicd)
            .build(),
        cicd("code_volume_vs_deployment_report", "jenkinsgithub")
            .family(ReportFamily::CodeVolume)
            .interval_in_payload()
            .week_starts_on_monday()
            .build(),
        cicd("cicd_pipeline_jobs_count_report", "jenkins")
            .family(ReportFamily::JenkinsAzure)
            .build(),
        cicd("cicd_pipeline_jobs_duration_report", "jenkins")
            .family(ReportFamily::JenkinsAzure)
            .build(),
        cicd("jenkins_job_config_change_counts_stat", "jenkins")
            .transform(TransformKind::Stat)
            .build(),
    ]
}

fn other_descriptors() -> Vec<ReportDescriptor> {
    vec![
        ReportDescriptor::builder("zendesk_tickets_report", "zendesk")
            .transform(TransformKind::Generic)
            .family(ReportFamily::TimeBucketedTickets)
            .build(),
        ReportDescriptor::builder("pagerduty_response_reports", "pagerduty")
            .transform(TransformKind::Generic)
            .family(ReportFamily::TimeBucketedTickets)
            .across_keys(&[("user_id", "user_ids"), ("pd_service", "pd_service_ids")])
            .build(),
        ReportDescriptor::builder("pagerduty_hotspot_report", "pagerduty")
            .transform(TransformKind::Generic)
            .build(),
        ReportDescriptor::builder("testrails_tests_report", "testrails")
            .transform(TransformKind::Generic)
            .build(),
        ReportDescriptor::builder("testrails_tests_trend_report", "testrails")
            .transform(TransformKind::Generic)
            .family(ReportFamily::TestrailsTrend)
            .build(),
        ReportDescriptor::builder("levelops_workitem_count_report", "levelops")
            .transform(TransformKind::Levelops)
            .across_keys(&[("state", "status"), ("assignee", "assignees"), ("tag", "tags")])
            .build(),
        ReportDescriptor::builder("levelops_assessment_count_report", "levelops")
            .transform(TransformKind::Levelops)
            .across_keys(&[("questionnaire_template_id", "questionnaire_template_ids"), ("completed", "completed")])
            .build(),
        ReportDescriptor::builder("dev_productivity_score_report", "any").build(),
        ReportDescriptor::builder("dora_lead_time_for_change", "any").build(),
    ]
}

pub(super) fn descriptors() -> Vec<ReportDescriptor> {
    let mut all = jira_descriptors();
    all.extend(azure_descriptors());
    all.extend(velocity_descriptors());
    all.extend(scm_descriptors());
    all.extend(cicd_descriptors());
    all.extend(other_descriptors());
    all
}
