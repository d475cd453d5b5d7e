//! Passes that scope the drill-down to integrations, org units and OR-queries

use super::PassContext;
use crate::constants::{GITHUB_APPLICATIONS, LEAD_TIME_APPLICATIONS, OR_QUERY_APPLICATIONS};
use crate::json::sanitized;
use crate::ou;
use crate::registry::ReportFamily;
use crate::types::FilterDocument;
use serde_json::Value;

pub(super) fn jenkins_azure_integrations(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if !ctx.descriptor.has_family(ReportFamily::JenkinsAzure) {
        return doc;
    }
    let ids = ctx
        .request
        .dashboard_query
        .get("integration_ids")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    doc.filter.insert("cicd_integration_ids".to_string(), ids.clone());
    doc.filter.insert("integration_ids".to_string(), ids);
    doc
}

/// The dashboard's jira OR-query
pub(super) fn or_query(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let disabled = ctx
        .request
        .context
        .widget_metadata
        .get("disable_or_filters")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let application = ctx.application();
    if disabled || !OR_QUERY_APPLICATIONS.iter().any(|app| application.contains(app)) {
        return doc;
    }
    let key = match &ctx.descriptor.jira_or_filter_key {
        Some(key) => key.clone(),
        None if application == "jira" => "or".to_string(),
        None => "jira_or".to_string(),
    };
    let query = sanitized(&ctx.request.dashboard_metadata.jira_or_query);
    tracing::trace!(key = %key, clauses = query.len(), "applying OR-query");
    doc.filter.insert(key, Value::Object(query));
    doc
}

pub(super) fn ou(doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    ou::compose(doc, ctx.request, ctx.descriptor, ctx.across)
}

fn integration_allowed(report_application: &str, integration_application: &str) -> bool {
    match report_application {
        "githubjira" => matches!(integration_application, "github" | "jira"),
        "github" => GITHUB_APPLICATIONS.contains(&integration_application),
        other => other == integration_application,
    }
}

/// Lead-time reports on a dashboard with both jira and azure keep only the
/// integrations their issue system can read
pub(super) fn integration_ids(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    let Some(available) = ctx.request.context.available_integrations.as_ref() else {
        return doc;
    };
    let has = |app: &str| available.iter().any(|i| i.application == app);
    let requested = doc
        .filter
        .get("integration_ids")
        .and_then(Value::as_array)
        .is_some_and(|ids| !ids.is_empty());
    if !LEAD_TIME_APPLICATIONS.contains(&ctx.application()) || !has("jira") || !has("azure_devops") || !requested {
        return doc;
    }

    let report_application = ctx.descriptor.application.as_str();
    let ids: Vec<Value> = available
        .iter()
        .filter(|integration| integration_allowed(report_application, &integration.application))
        .map(|integration| Value::String(integration.id.clone()))
        .collect();
    tracing::debug!(
        report = ctx.report_type(),
        kept = ids.len(),
        "narrowed integration ids"
    );
    doc.filter.insert("integration_ids".to_string(), Value::Array(ids));
    doc
}

pub(super) fn apply_ou_on_velocity_report(mut doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
    if let Some(value) = ctx.request.metadata.get("apply_ou_on_velocity_report") {
        doc.apply_ou_on_velocity_report = Some(value.clone());
    }
    doc
}
