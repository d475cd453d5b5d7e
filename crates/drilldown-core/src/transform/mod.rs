//! Report-specific rewrites
//!
//! Every drillable report names a [`TransformKind`] in its descriptor. The
//! transform turns the click into an initial filter document; the pipeline
//! passes refine it afterwards. Transforms are plain functions over a
//! borrowed [`TransformInput`] and never fail.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

mod business_alignment;
mod generic;
mod issue_management;
mod levelops;
mod sprint;
mod stat;

pub use business_alignment::{effort_investment_engineer, effort_investment_trend};
pub use generic::generic;
pub use issue_management::{
    azure, azure_backlog_trend, azure_hygiene, epic_priority, jira, jira_backlog, jira_bounce,
    jira_burndown, jira_hygiene,
};
pub use levelops::levelops;
pub use sprint::sprint_metric_trend;
pub use stat::stat;

use crate::across;
use crate::json::FilterMap;
use crate::registry::ReportDescriptor;
use crate::types::{
    DashboardMetadata, DrillDownContext, DrillDownRequest, FilterDocument, WidgetDescriptor,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything a transform may read
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
    pub context: &'a DrillDownContext,
    pub widget: &'a WidgetDescriptor,
    pub dashboard_query: &'a FilterMap,
    pub metadata: &'a FilterMap,
    pub dashboard_metadata: &'a DashboardMetadata,
    pub query_param_ou: Option<&'a str>,
    pub context_filters: &'a FilterMap,
    pub descriptor: &'a ReportDescriptor,
    /// Across after hygiene resolution
    pub across: &'a str,
    pub now: Option<i64>,
}

impl<'a> TransformInput<'a> {
    pub fn new(request: &'a DrillDownRequest, descriptor: &'a ReportDescriptor, across: &'a str) -> Self {
        Self {
            context: &request.context,
            widget: &request.widget,
            dashboard_query: &request.dashboard_query,
            metadata: &request.metadata,
            dashboard_metadata: &request.dashboard_metadata,
            query_param_ou: request.query_param_ou.as_deref(),
            context_filters: &request.context_filters,
            descriptor,
            across,
            now: request.now,
        }
    }

    pub fn application(&self) -> &str {
        self.context.application.as_str()
    }

    /// Backend key for the current across
    pub fn across_key(&self) -> String {
        across::filter_key(self.across, self.descriptor)
    }

    /// The widget query without its `across`
    pub fn widget_filter(&self) -> FilterMap {
        let mut query = self.widget.query.clone();
        query.remove("across");
        query
    }
}

/// A transform's result
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub across_value: String,
    pub filters: FilterDocument,
}

/// Signature of a transform registered from code
pub type TransformFn = for<'a> fn(&TransformInput<'a>) -> TransformOutput;

/// A code-registered transform
#[derive(Clone, Copy)]
pub struct CustomTransform(pub TransformFn);

impl fmt::Debug for CustomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomTransform(..)")
    }
}

/// The transform a descriptor names
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Generic,
    Levelops,
    Jira,
    Azure,
    JiraHygiene,
    AzureHygiene,
    JiraBounce,
    JiraBacklog,
    AzureBacklogTrend,
    JiraBurndown,
    SprintMetricTrend,
    EpicPriority,
    EffortInvestmentTrend,
    EffortInvestmentEngineer,
    Stat,
    /// Only registrable from code
    #[serde(skip)]
    Custom(CustomTransform),
}

impl TransformKind {
    pub fn apply(&self, input: &TransformInput<'_>) -> TransformOutput {
        match self {
            TransformKind::Generic => generic(input),
            TransformKind::Levelops => levelops(input),
            TransformKind::Jira => jira(input),
            TransformKind::Azure => azure(input),
            TransformKind::JiraHygiene => jira_hygiene(input),
            TransformKind::AzureHygiene => azure_hygiene(input),
            TransformKind::JiraBounce => jira_bounce(input),
            TransformKind::JiraBacklog => jira_backlog(input),
            TransformKind::AzureBacklogTrend => azure_backlog_trend(input),
            TransformKind::JiraBurndown => jira_burndown(input),
            TransformKind::SprintMetricTrend => sprint_metric_trend(input),
            TransformKind::EpicPriority => epic_priority(input),
            TransformKind::EffortInvestmentTrend => effort_investment_trend(input),
            TransformKind::EffortInvestmentEngineer => effort_investment_engineer(input),
            TransformKind::Stat => stat(input),
            TransformKind::Custom(custom) => (custom.0)(input),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformKind::Generic => "generic",
            TransformKind::Levelops => "levelops",
            TransformKind::Jira => "jira",
            TransformKind::Azure => "azure",
            TransformKind::JiraHygiene => "jira_hygiene",
            TransformKind::AzureHygiene => "azure_hygiene",
            TransformKind::JiraBounce => "jira_bounce",
            TransformKind::JiraBacklog => "jira_backlog",
            TransformKind::AzureBacklogTrend => "azure_backlog_trend",
            TransformKind::JiraBurndown => "jira_burndown",
            TransformKind::SprintMetricTrend => "sprint_metric_trend",
            TransformKind::EpicPriority => "epic_priority",
            TransformKind::EffortInvestmentTrend => "effort_investment_trend",
            TransformKind::EffortInvestmentEngineer => "effort_investment_engineer",
            TransformKind::Stat => "stat",
            TransformKind::Custom(_) => "custom",
        }
    }
}

impl PartialEq for TransformKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TransformKind::Custom(a), TransformKind::Custom(b)) => a.0 as usize == b.0 as usize,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use serde_json::Value;

    /// Run a transform over a request given as JSON
    pub fn run(kind: TransformKind, descriptor: &ReportDescriptor, request: Value) -> TransformOutput {
        let request = DrillDownRequest::from_value(request).unwrap();
        let across = across::resolve(&request.requested_across(), &request.widget);
        let input = TransformInput::new(&request, descriptor, &across);
        kind.apply(&input)
    }
}
