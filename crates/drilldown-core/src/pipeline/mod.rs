//! Drill-down compilation pipeline
//!
//! Compilation looks the widget's report up in the registry, runs the
//! report's transform, and then folds the resulting [`FilterDocument`]
//! through a fixed sequence of [`FilterPass`]es. Each pass is a plain
//! function that takes the document by value and returns the rewritten
//! one; passes that do not apply to the report return it untouched.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

mod scope;
mod shape;
mod time;

use crate::across;
use crate::dates::{Interval, WeekFormat};
use crate::registry::{ReportDescriptor, ReportRegistry};
use crate::transform::{TransformInput, TransformOutput};
use crate::types::{CompiledDrilldown, DrillDownRequest, DrilldownOutcome, FilterDocument, XAxis};
use serde_json::Value;
use std::fmt;
use std::time::Instant;

/// Everything a pass may read besides the document itself
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    pub request: &'a DrillDownRequest,
    pub descriptor: &'a ReportDescriptor,
    /// Across value returned by the transform
    pub across: &'a str,
    /// `filter.interval` as the transform produced it
    pub interval: Option<&'a Value>,
}

impl<'a> PassContext<'a> {
    pub fn x_axis(&self) -> &'a XAxis {
        &self.request.context.x_axis
    }

    pub fn report_type(&self) -> &'a str {
        self.descriptor.report_type.as_str()
    }

    /// Application of the click, which may differ from the report's
    pub fn application(&self) -> &'a str {
        self.request.context.application.as_str()
    }

    pub fn week_format(&self) -> WeekFormat {
        WeekFormat::parse(self.request.week_format())
    }

    /// Bucket interval named by the document's filter
    pub fn filter_interval(&self, doc: &FilterDocument) -> Interval {
        Interval::from_filter(
            doc.filter.get("interval").and_then(Value::as_str),
            self.descriptor.week_starts_on_monday,
        )
    }
}

/// One named rewrite step
#[derive(Clone, Copy)]
pub struct FilterPass {
    pub name: &'static str,
    pub apply: fn(FilterDocument, &PassContext<'_>) -> FilterDocument,
}

impl FilterPass {
    pub const fn new(name: &'static str, apply: fn(FilterDocument, &PassContext<'_>) -> FilterDocument) -> Self {
        Self { name, apply }
    }
}

impl fmt::Debug for FilterPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPass").field("name", &self.name).finish()
    }
}

/// An ordered list of passes
#[derive(Debug, Clone)]
pub struct CompilationPipeline {
    passes: Vec<FilterPass>,
}

impl Default for CompilationPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl CompilationPipeline {
    /// The passes every drill-down goes through, in order
    pub fn standard() -> Self {
        let passes = vec![
            FilterPass::new("partial_match_sanitize", shape::partial_match_sanitize),
            FilterPass::new("dashboard_time", time::dashboard_time),
            FilterPass::new("clear_update_markers", shape::clear_update_markers),
            FilterPass::new("scm_pr_across", time::scm_pr_across),
            FilterPass::new("time_bucketed_tickets", time::time_bucketed_tickets),
            FilterPass::new("stage_bounce", time::stage_bounce),
            FilterPass::new("commits_trend", time::commits_trend),
            FilterPass::new("parent_keys", shape::parent_keys),
            FilterPass::new("pr_trend", time::pr_trend),
            FilterPass::new("velocity_profile", shape::velocity_profile),
            FilterPass::new("custom_field_namespace", shape::custom_field_namespace),
            FilterPass::new("unresolved_resolutions", shape::unresolved_last),
            FilterPass::new("cicd_end_time", time::cicd_end_time),
            FilterPass::new("jenkins_azure_integrations", scope::jenkins_azure_integrations),
            FilterPass::new("scm_files_filename", shape::scm_files_filename),
            FilterPass::new("sprint_single_stat_flags", shape::sprint_single_stat_flags),
            FilterPass::new("or_query", scope::or_query),
            FilterPass::new("azure_priorities", shape::azure_priorities),
            FilterPass::new("normalize", shape::normalize),
            FilterPass::new("sprint_goal", shape::sprint_goal),
            FilterPass::new("drop_sort_and_teams", shape::drop_sort_and_teams),
            FilterPass::new("sprint_trend_completed_at", time::sprint_trend_completed_at),
            FilterPass::new("legacy_keys", shape::legacy_keys),
            FilterPass::new("code_volume_end_time", time::code_volume_end_time),
            FilterPass::new("custom_date_sanitize", shape::custom_date_sanitize),
            FilterPass::new("active_sprint_swap", shape::active_sprint_swap),
            FilterPass::new("ou", scope::ou),
            FilterPass::new("unsupported_filters", shape::unsupported_filters),
            FilterPass::new("custom_stacks", shape::custom_stacks),
            FilterPass::new("sprint_distribution_keys", shape::sprint_distribution_keys),
            FilterPass::new("committed_at_sanitize", time::committed_at_sanitize),
            FilterPass::new("resolutions", shape::resolutions),
            FilterPass::new("integration_ids", scope::integration_ids),
            FilterPass::new("interval", shape::interval),
            FilterPass::new("apply_ou_on_velocity_report", scope::apply_ou_on_velocity_report),
            FilterPass::new("azure_custom_fields", shape::azure_custom_fields),
            FilterPass::new("testrails_trend", time::testrails_trend),
        ];
        Self { passes }
    }

    /// A pipeline with no passes
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Append a pass
    pub fn with_pass(mut self, pass: FilterPass) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn passes(&self) -> &[FilterPass] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Fold `doc` through every pass
    pub fn run(&self, doc: FilterDocument, ctx: &PassContext<'_>) -> FilterDocument {
        self.passes.iter().fold(doc, |doc, pass| {
            tracing::trace!(pass = pass.name, report = ctx.report_type(), "applying pass");
            (pass.apply)(doc, ctx)
        })
    }

    /// Compile one request against `registry`
    pub fn compile(&self, request: &DrillDownRequest, registry: &ReportRegistry) -> DrilldownOutcome {
        let start = Instant::now();
        let report_type = request.widget.report_type.as_str();

        let Some(descriptor) = registry.get(report_type) else {
            tracing::debug!(report = report_type, "unknown report, nothing to drill into");
            return DrilldownOutcome::Empty;
        };
        let Some(transform) = descriptor.transform else {
            tracing::debug!(report = report_type, "report is not drillable");
            return DrilldownOutcome::Empty;
        };

        let across = across::resolve(&request.requested_across(), &request.widget);
        let input = TransformInput::new(request, descriptor, &across);
        let TransformOutput {
            across_value,
            filters,
        } = transform.apply(&input);
        tracing::debug!(
            report = report_type,
            transform = %transform,
            across = %across_value,
            "dispatched drill-down"
        );

        let interval = filters.filter.get("interval").cloned();
        let ctx = PassContext {
            request,
            descriptor,
            across: &across_value,
            interval: interval.as_ref(),
        };
        let filters = self.run(filters, &ctx);

        tracing::debug!(
            report = report_type,
            elapsed_us = start.elapsed().as_micros() as u64,
            "drill-down compiled"
        );
        DrilldownOutcome::Composed(CompiledDrilldown {
            across_value,
            filters,
        })
    }
}

/// Compile one request with the standard pipeline
///
/// Unknown and non-drillable reports yield [`DrilldownOutcome::Empty`].
///
/// # Example
///
/// ```
/// use drilldown_core::{compile, DrillDownRequest, ReportRegistry};
///
/// let request = DrillDownRequest::from_json(r#"{"widget": {"type": "no_such_report"}}"#).unwrap();
/// let outcome = compile(&request, &ReportRegistry::builtin());
/// assert_eq!(outcome.to_value(), serde_json::json!({}));
/// ```
pub fn compile(request: &DrillDownRequest, registry: &ReportRegistry) -> DrilldownOutcome {
    CompilationPipeline::standard().compile(request, registry)
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    /// Run a single pass over a document built from `filter`
    pub fn run_pass(
        apply: fn(FilterDocument, &PassContext<'_>) -> FilterDocument,
        descriptor: &ReportDescriptor,
        request: Value,
        across: &str,
        doc: FilterDocument,
    ) -> FilterDocument {
        let request = DrillDownRequest::from_value(request).unwrap();
        let interval = doc.filter.get("interval").cloned();
        let ctx = PassContext {
            request: &request,
            descriptor,
            across,
            interval: interval.as_ref(),
        };
        apply(doc, &ctx)
    }

    pub fn doc(across: &str, filter: Value) -> FilterDocument {
        FilterDocument::new(across, filter.as_object().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> ReportRegistry {
        let mut registry = ReportRegistry::new();
        registry.register(
            ReportDescriptor::builder("tickets_report", "jira")
                .transform(TransformKind::Jira)
                .build(),
        );
        registry.register(ReportDescriptor::builder("jira_static_report", "jira").build());
        registry
    }

    fn mark(mut doc: FilterDocument, _ctx: &PassContext<'_>) -> FilterDocument {
        doc.extra.insert("marked".to_string(), Value::Bool(true));
        doc
    }

    #[test]
    fn test_unknown_and_static_reports_are_empty() {
        let registry = registry();
        for report in ["missing_report", "jira_static_report"] {
            let request = DrillDownRequest::from_value(json!({"widget": {"type": report}})).unwrap();
            assert!(compile(&request, &registry).is_empty(), "{report}");
        }
    }

    #[test]
    fn test_standard_pipeline_order() {
        let pipeline = CompilationPipeline::standard();
        let names: Vec<_> = pipeline.passes().iter().map(|p| p.name).collect();
        assert_eq!(names.first(), Some(&"partial_match_sanitize"));
        assert_eq!(names.last(), Some(&"testrails_trend"));
        let pos = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(pos("custom_field_namespace") < pos("legacy_keys"));
        assert!(pos("legacy_keys") < pos("ou"));
        assert!(pos("normalize") < pos("sprint_goal"));
        assert_eq!(pos("azure_custom_fields"), pos("apply_ou_on_velocity_report") + 1);
    }

    #[test]
    fn test_custom_pass_runs_last() {
        let pipeline = CompilationPipeline::empty().with_pass(FilterPass::new("mark", mark));
        let request = DrillDownRequest::from_value(json!({
            "context": {"application": "jira", "x_axis": "High"},
            "widget": {"type": "tickets_report", "query": {"across": "priority"}}
        }))
        .unwrap();
        let outcome = pipeline.compile(&request, &registry());
        let compiled = outcome.compiled().unwrap();
        assert_eq!(compiled.filters.extra["marked"], json!(true));
        assert_eq!(compiled.filters.filter["priorities"], json!(["High"]));
    }
}
