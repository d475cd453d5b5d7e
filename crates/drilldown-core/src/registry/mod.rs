//! Report descriptor registry
//!
//! Every widget type the dashboard knows about is described by a
//! [`ReportDescriptor`]. The compiler only reads descriptors; it never
//! mutates them. A registry starts from the built-in tables and can be
//! extended with descriptors loaded from JSON or YAML.
//!
//! # Example
//!
//! ```
//! use drilldown_core::registry::{ReportDescriptor, ReportFamily, ReportRegistry};
//! use drilldown_core::transform::TransformKind;
//!
//! let mut registry = ReportRegistry::builtin();
//! registry.register(
//!     ReportDescriptor::builder("custom_tickets_report", "jira")
//!         .transform(TransformKind::Jira)
//!         .family(ReportFamily::TimeBucketedTickets)
//!         .build(),
//! );
//! assert!(registry.get("custom_tickets_report").is_some());
//! ```
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

mod builtin;

use crate::error::{Error, Result};
use crate::export::TabularKind;
use crate::transform::TransformKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Tags that gate the report-specific passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFamily {
    /// Ticket counts bucketed by created/updated/resolved/due
    TimeBucketedTickets,
    /// SCM pull request reports
    ScmPrs,
    /// PR trend charts (created/merged/first review)
    GithubPrsTrend,
    /// Commit and rework trends
    CommitsTrend,
    StageBounce,
    /// Lead-time and DORA reports driven by a velocity profile
    VelocityProfile,
    /// Lead-time reports with a single histogram stage
    LeadTimeByStage,
    /// Azure DevOps issue management reports
    IssueManagement,
    /// Jenkins/SCM job reports filtered by job end time
    ScmCicd,
    /// Jenkins reports that take integration ids from the dashboard
    JenkinsAzure,
    SprintMetricsTrend,
    SprintSingleStatJira,
    SprintSingleStatAzure,
    SprintGoal,
    SprintDistribution,
    ScmFiles,
    CodeVolume,
    TestrailsTrend,
    BusinessAlignment,
    HygieneTrend,
}

/// Static description of one report type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDescriptor {
    pub report_type: String,
    pub application: String,
    /// UI dimension to backend key, checked before the global table
    pub across_key_map: BTreeMap<String, String>,
    /// Namespace for exact-match custom fields; `None` skips the namespace pass
    pub custom_field_key: Option<String>,
    /// Prefix for partial-match custom-field keys
    pub custom_field_prefix: String,
    pub partial_match_key: String,
    pub include_across_ou_exclusions: bool,
    pub include_interval_in_payload: bool,
    /// Legacy key renames applied near the end of compilation
    pub legacy_key_renames: BTreeMap<String, String>,
    pub week_starts_on_monday: bool,
    /// Trend labels are `DD MMM YYYY` dates rather than integers
    pub label_to_timestamp: bool,
    /// Clamp trend and backlog timestamps to the request's `now`
    pub compare_x_axis_timestamp: bool,
    pub jira_or_filter_key: Option<String>,
    pub unsupported_filter_keys: Vec<String>,
    pub azure_iteration_supported: bool,
    pub families: BTreeSet<ReportFamily>,
    pub tabular: Option<TabularKind>,
    /// `None` marks a report that cannot be drilled into
    pub transform: Option<TransformKind>,
}

impl Default for ReportDescriptor {
    fn default() -> Self {
        Self {
            report_type: String::new(),
            application: String::new(),
            across_key_map: BTreeMap::new(),
            custom_field_key: None,
            custom_field_prefix: String::new(),
            partial_match_key: crate::constants::PARTIAL_MATCH_KEY.to_string(),
            include_across_ou_exclusions: true,
            include_interval_in_payload: false,
            legacy_key_renames: BTreeMap::new(),
            week_starts_on_monday: false,
            label_to_timestamp: true,
            compare_x_axis_timestamp: false,
            jira_or_filter_key: None,
            unsupported_filter_keys: Vec::new(),
            azure_iteration_supported: false,
            families: BTreeSet::new(),
            tabular: None,
            transform: None,
        }
    }
}

impl ReportDescriptor {
    pub fn builder(
        report_type: impl Into<String>,
        application: impl Into<String>,
    ) -> ReportDescriptorBuilder {
        ReportDescriptorBuilder::new(report_type, application)
    }

    pub fn has_family(&self, family: ReportFamily) -> bool {
        self.families.contains(&family)
    }

    pub fn is_drillable(&self) -> bool {
        self.transform.is_some()
    }

    pub fn is_azure(&self) -> bool {
        self.application == "azure_devops"
    }

    /// Reject descriptors that could never be looked up
    pub fn validate(&self) -> Result<()> {
        if self.report_type.trim().is_empty() {
            return Err(Error::Validation {
                field: "report_type".to_string(),
                message: "must not be empty".to_string(),
                expected: Some("a report type id".to_string()),
            });
        }
        if self.partial_match_key.is_empty() {
            return Err(Error::Validation {
                field: "partial_match_key".to_string(),
                message: format!("empty for report '{}'", self.report_type),
                expected: Some("partial_match".to_string()),
            });
        }
        Ok(())
    }
}

/// Fluent construction of [`ReportDescriptor`]s
#[derive(Debug, Clone)]
pub struct ReportDescriptorBuilder {
    descriptor: ReportDescriptor,
}

impl ReportDescriptorBuilder {
    pub fn new(report_type: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            descriptor: ReportDescriptor {
                report_type: report_type.into(),
                application: application.into(),
                ..Default::default()
            },
        }
    }

    pub fn transform(mut self, transform: TransformKind) -> Self {
        self.descriptor.transform = Some(transform);
        self
    }

    pub fn family(mut self, family: ReportFamily) -> Self {
        self.descriptor.families.insert(family);
        self
    }

    pub fn families<I>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = ReportFamily>,
    {
        self.descriptor.families.extend(families);
        self
    }

    pub fn across_key(mut self, across: &str, key: &str) -> Self {
        self.descriptor
            .across_key_map
            .insert(across.to_string(), key.to_string());
        self
    }

    pub fn across_keys(mut self, pairs: &[(&str, &str)]) -> Self {
        for (across, key) in pairs {
            self.descriptor
                .across_key_map
                .insert(across.to_string(), key.to_string());
        }
        self
    }

    pub fn custom_fields(mut self, key: &str, prefix: &str) -> Self {
        self.descriptor.custom_field_key = Some(key.to_string());
        self.descriptor.custom_field_prefix = prefix.to_string();
        self
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.descriptor
            .legacy_key_renames
            .insert(from.to_string(), to.to_string());
        self
    }

    pub fn without_across_ou_exclusions(mut self) -> Self {
        self.descriptor.include_across_ou_exclusions = false;
        self
    }

    pub fn interval_in_payload(mut self) -> Self {
        self.descriptor.include_interval_in_payload = true;
        self
    }

    pub fn week_starts_on_monday(mut self) -> Self {
        self.descriptor.week_starts_on_monday = true;
        self
    }

    pub fn integer_trend_labels(mut self) -> Self {
        self.descriptor.label_to_timestamp = false;
        self
    }

    pub fn compare_x_axis_timestamp(mut self) -> Self {
        self.descriptor.compare_x_axis_timestamp = true;
        self
    }

    pub fn or_filter_key(mut self, key: &str) -> Self {
        self.descriptor.jira_or_filter_key = Some(key.to_string());
        self
    }

    pub fn unsupported_filter(mut self, key: &str) -> Self {
        self.descriptor.unsupported_filter_keys.push(key.to_string());
        self
    }

    pub fn azure_iteration(mut self) -> Self {
        self.descriptor.azure_iteration_supported = true;
        self
    }

    pub fn tabular(mut self, kind: TabularKind) -> Self {
        self.descriptor.tabular = Some(kind);
        self
    }

    pub fn build(self) -> ReportDescriptor {
        self.descriptor
    }
}

/// Lookup table of report descriptors keyed by report type
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    reports: HashMap<String, ReportDescriptor>,
}

impl ReportRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in report tables
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin::descriptors() {
            registry.reports.insert(descriptor.report_type.clone(), descriptor);
        }
        tracing::debug!(reports = registry.len(), "built-in registry loaded");
        registry
    }

    /// Insert a descriptor, returning the one it replaced
    pub fn register(&mut self, descriptor: ReportDescriptor) -> Option<ReportDescriptor> {
        let previous = self
            .reports
            .insert(descriptor.report_type.clone(), descriptor);
        if let Some(prev) = &previous {
            log::warn!("Report descriptor '{}' replaced", prev.report_type);
        }
        previous
    }

    pub fn get(&self, report_type: &str) -> Option<&ReportDescriptor> {
        self.reports.get(report_type)
    }

    pub fn contains(&self, report_type: &str) -> bool {
        self.reports.contains_key(report_type)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Descriptors sorted by report type
    pub fn descriptors(&self) -> Vec<&ReportDescriptor> {
        let mut all: Vec<_> = self.reports.values().collect();
        all.sort_by(|a, b| a.report_type.cmp(&b.report_type));
        all
    }

    /// Merge a list of descriptors, validating each one
    pub fn extend<I>(&mut self, descriptors: I) -> Result<usize>
    where
        I: IntoIterator<Item = ReportDescriptor>,
    {
        let mut count = 0;
        for descriptor in descriptors {
            descriptor.validate()?;
            self.register(descriptor);
            count += 1;
        }
        Ok(count)
    }

    /// Merge descriptors from a JSON array
    pub fn extend_from_json(&mut self, input: &str) -> Result<usize> {
        let descriptors: Vec<ReportDescriptor> = serde_json::from_str(input)?;
        self.extend(descriptors)
    }

    /// Merge descriptors from a YAML sequence
    pub fn extend_from_yaml(&mut self, input: &str) -> Result<usize> {
        let descriptors: Vec<ReportDescriptor> = serde_yaml::from_str(input)?;
        self.extend(descriptors)
    }

    /// Merge descriptors from a `.json`, `.yaml` or `.yml` file
    pub fn extend_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.extend_from_json(&content),
            Some("yaml") | Some("yml") => self.extend_from_yaml(&content),
            _ => Err(Error::Registry {
                message: format!("Unsupported registry file format: {}", path.display()),
                report_type: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let descriptor = ReportDescriptor::builder("tickets_report", "jira").build();
        assert_eq!(descriptor.partial_match_key, "partial_match");
        assert!(descriptor.include_across_ou_exclusions);
        assert!(descriptor.label_to_timestamp);
        assert!(!descriptor.is_drillable());
    }

    #[test]
    fn test_builtin_has_core_reports() {
        let registry = ReportRegistry::builtin();
        for report in [
            "tickets_report",
            "levelops_workitem_count_report",
            "azure_tickets_report",
            "github_prs_report",
            "pagerduty_response_reports",
        ] {
            assert!(registry.get(report).is_some(), "missing {report}");
        }
        assert!(registry.get("no_such_report").is_none());
    }

    #[test]
    fn test_builtin_descriptors_validate() {
        let registry = ReportRegistry::builtin();
        for descriptor in registry.descriptors() {
            descriptor.validate().unwrap();
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ReportRegistry::builtin();
        let replaced = registry.register(
            ReportDescriptor::builder("tickets_report", "jira").build(),
        );
        assert!(replaced.is_some());
        assert!(!registry.get("tickets_report").unwrap().is_drillable());
    }

    #[test]
    fn test_extend_from_json() {
        let mut registry = ReportRegistry::new();
        let count = registry
            .extend_from_json(
                r#"[{
                    "report_type": "custom_report",
                    "application": "jira",
                    "transform": "generic",
                    "families": ["time_bucketed_tickets"],
                    "legacy_key_renames": {"sprint": "name"}
                }]"#,
            )
            .unwrap();
        assert_eq!(count, 1);
        let descriptor = registry.get("custom_report").unwrap();
        assert_eq!(descriptor.transform, Some(TransformKind::Generic));
        assert!(descriptor.has_family(ReportFamily::TimeBucketedTickets));
        assert_eq!(descriptor.partial_match_key, "partial_match");
    }

    #[test]
    fn test_extend_from_yaml_rejects_empty_type() {
        let mut registry = ReportRegistry::new();
        let result = registry.extend_from_yaml("- report_type: ''\n  application: jira\n");
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_extend_from_file_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.txt");
        std::fs::write(&path, "[]").unwrap();
        let mut registry = ReportRegistry::new();
        assert!(matches!(
            registry.extend_from_file(&path),
            Err(Error::Registry { .. })
        ));
    }
}
