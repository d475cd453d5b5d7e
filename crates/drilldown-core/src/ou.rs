//! Organizational-unit filter composition
//!
//! When the dashboard (or the page URL) selects one or more org units, the
//! backend needs the OU ids, the per-application user designations, and
//! the across key to exclude from OU expansion.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

use crate::across::filter_key;
use crate::constants::{
    is_time_filter_key, AZURE_ITERATION_SPRINT_DESIGNATION, OU_SPRINT_APPLICATIONS,
    OU_SUPPORTED_APPLICATIONS, PAGERDUTY_RESPONSE_REPORT,
};
use crate::json::{object_at, sanitized, FilterMap};
use crate::registry::ReportDescriptor;
use crate::types::{DrillDownRequest, FilterDocument};
use serde_json::Value;

/// Applications whose designations a report honours
pub fn supported_applications(descriptor: &ReportDescriptor) -> Vec<String> {
    let list: &[&str] = match descriptor.report_type.as_str() {
        "lead_time_by_stage_report" | "lead_time_by_type_report" | "lead_time_trend_report" => {
            &["jira"]
        }
        "azure_lead_time_single_stat" => &["azure_devops", "github"],
        "lead_time_single_stat" | "scm_jira_files_report" => &["jira", "github"],
        _ if descriptor.application == "jenkinsgithub" => &["jenkins"],
        _ => return vec![descriptor.application.clone()],
    };
    list.iter().map(|s| s.to_string()).collect()
}

/// OU ids in effect: the page's OU wins over the dashboard's
pub fn selected_ou_ids(request: &DrillDownRequest) -> Vec<String> {
    match request.query_param_ou.as_deref() {
        Some(ou) if !ou.is_empty() => vec![ou.to_string()],
        _ => request.dashboard_metadata.ou_ids.clone(),
    }
}

/// Add OU ids, designations and exclusions to the document
pub fn compose(
    mut doc: FilterDocument,
    request: &DrillDownRequest,
    descriptor: &ReportDescriptor,
    across: &str,
) -> FilterDocument {
    let ou_ids = selected_ou_ids(request);
    let application = descriptor.application.as_str();
    let eligible = OU_SUPPORTED_APPLICATIONS.contains(&application)
        || descriptor.report_type == PAGERDUTY_RESPONSE_REPORT;
    if ou_ids.is_empty() || !eligible {
        return doc;
    }

    doc.ou_ids = Some(ou_ids);

    let designation = designations(request, descriptor);
    if !designation.is_empty() {
        doc.ou_user_filter_designation = Some(designation);
    }

    let exclusion = filter_key(across, descriptor);
    if descriptor.include_across_ou_exclusions && !exclusion.is_empty() && !is_time_filter_key(across) {
        doc.ou_exclusions = Some(vec![exclusion]);
    }
    doc
}

/// Merge user designations: dashboard, then widget metadata, then report metadata
pub fn designations(request: &DrillDownRequest, descriptor: &ReportDescriptor) -> FilterMap {
    let mut combined = request.dashboard_metadata.ou_user_filter_designation.clone();
    for source in [
        object_at(&request.context.widget_metadata, "ou_user_filter_designation"),
        object_at(&request.metadata, "ou_user_filter_designation"),
    ]
    .into_iter()
    .flatten()
    {
        for (k, v) in sanitized(source) {
            combined.insert(k, v);
        }
    }

    let supported = supported_applications(descriptor);
    combined.retain(|key, _| supported.iter().any(|app| app == key));

    if OU_SPRINT_APPLICATIONS.contains(&descriptor.application.as_str()) {
        let sprint = if descriptor.azure_iteration_supported {
            Some(AZURE_ITERATION_SPRINT_DESIGNATION.to_string())
        } else {
            request
                .context
                .supported_custom_fields
                .iter()
                .find(|f| f.name.to_lowercase().contains("sprint"))
                .map(|f| f.field_key.clone())
                .filter(|key| !key.is_empty())
        };
        match sprint {
            Some(value) => {
                combined.insert("sprint".to_string(), Value::from(vec![value]));
            }
            None => {
                combined.remove("sprint");
            }
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomFieldDef;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(value: Value) -> DrillDownRequest {
        DrillDownRequest::from_value(value).unwrap()
    }

    fn jira_tickets() -> ReportDescriptor {
        ReportDescriptor::builder("tickets_report", "jira").build()
    }

    #[test]
    fn test_no_ou_ids_is_noop() {
        let doc = FilterDocument::new("assignee", FilterMap::new());
        let out = compose(doc.clone(), &request(json!({})), &jira_tickets(), "assignee");
        assert_eq!(out, doc);
    }

    #[test]
    fn test_query_param_ou_wins() {
        let req = request(json!({
            "queryParamOU": "7",
            "dashboard_metadata": {"ou_ids": ["1", "2"]}
        }));
        assert_eq!(selected_ou_ids(&req), vec!["7".to_string()]);
    }

    #[test]
    fn test_compose_sets_ids_designations_and_exclusions() {
        let mut req = request(json!({
            "dashboard_metadata": {
                "ou_ids": ["1"],
                "ou_user_filter_designation": {"jira": ["customfield_5"], "github": ["x"]}
            },
            "metadata": {"ou_user_filter_designation": {"jira": ["customfield_6"], "zendesk": []}}
        }));
        req.context.supported_custom_fields = vec![CustomFieldDef {
            name: "Sprint".into(),
            field_key: "customfield_10020".into(),
            ..CustomFieldDef::default()
        }];

        let out = compose(
            FilterDocument::new("assignee", FilterMap::new()),
            &req,
            &jira_tickets(),
            "assignee",
        );
        assert_eq!(out.ou_ids, Some(vec!["1".to_string()]));
        assert_eq!(
            Value::Object(out.ou_user_filter_designation.unwrap()),
            json!({"jira": ["customfield_6"], "sprint": ["customfield_10020"]})
        );
        assert_eq!(out.ou_exclusions, Some(vec!["assignees".to_string()]));
    }

    #[test]
    fn test_time_across_has_no_exclusion() {
        let req = request(json!({"dashboard_metadata": {"ou_ids": ["1"]}}));
        let out = compose(
            FilterDocument::new("issue_created", FilterMap::new()),
            &req,
            &jira_tickets(),
            "issue_created",
        );
        assert!(out.ou_exclusions.is_none());
        assert!(out.ou_user_filter_designation.is_none());
    }

    #[test]
    fn test_ineligible_application_skipped() {
        let req = request(json!({"dashboard_metadata": {"ou_ids": ["1"]}}));
        let descriptor = ReportDescriptor::builder("levelops_workitem_count_report", "levelops").build();
        let out = compose(FilterDocument::default(), &req, &descriptor, "state");
        assert!(out.ou_ids.is_none());
    }

    #[test]
    fn test_azure_iteration_sprint_designation() {
        let req = request(json!({"dashboard_metadata": {"ou_ids": ["1"]}}));
        let descriptor = ReportDescriptor::builder("azure_tickets_report", "azure_devops")
            .azure_iteration()
            .build();
        assert_eq!(
            Value::Object(designations(&req, &descriptor)),
            json!({"sprint": ["sprint_report"]})
        );
    }

    #[test]
    fn test_supported_applications() {
        let jenkins = ReportDescriptor::builder("cicd_scm_jobs_count_report", "jenkinsgithub").build();
        assert_eq!(supported_applications(&jenkins), vec!["jenkins".to_string()]);
        let stat = ReportDescriptor::builder("lead_time_single_stat", "jira").build();
        assert_eq!(supported_applications(&stat), vec!["jira".to_string(), "github".to_string()]);
    }
}
