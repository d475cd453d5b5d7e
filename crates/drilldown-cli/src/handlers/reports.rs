//! Reports command handler

use super::utils::load_registry;
use crate::cli::{OutputFormat, ReportsArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use drilldown_core::{ReportDescriptor, ReportFamily};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// One row of the registry listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub report_type: String,
    pub application: String,
    pub drillable: bool,
    pub transform: Option<String>,
    pub families: Vec<ReportFamily>,
}

impl From<&ReportDescriptor> for ReportSummary {
    fn from(descriptor: &ReportDescriptor) -> Self {
        Self {
            report_type: descriptor.report_type.clone(),
            application: descriptor.application.clone(),
            drillable: descriptor.is_drillable(),
            transform: descriptor
                .transform
                .as_ref()
                .map(|kind| serde_name(kind).unwrap_or_else(|| "custom".to_string())),
            families: descriptor.families.iter().copied().collect(),
        }
    }
}

/// Handle the reports command
pub fn handle_reports(args: ReportsArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let registry = load_registry(&args.registry, config)?;

    let pattern = args
        .matching
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| Error::invalid_args(format!("Invalid --matching pattern: {}", e)))?;

    let summaries: Vec<ReportSummary> = registry
        .descriptors()
        .into_iter()
        .filter(|d| args.application.as_deref().map_or(true, |app| d.application == app))
        .filter(|d| !args.drillable || d.is_drillable())
        .filter(|d| pattern.as_ref().map_or(true, |re| re.is_match(&d.report_type)))
        .map(ReportSummary::from)
        .collect();
    debug!(total = registry.len(), shown = summaries.len(), "Listing reports");

    if output.format() != OutputFormat::Human {
        return output.data(&summaries);
    }

    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.report_type.clone(),
                s.application.clone(),
                s.transform.clone().unwrap_or_else(|| "-".to_string()),
                s.families
                    .iter()
                    .filter_map(serde_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            ]
        })
        .collect();
    output.table(&["REPORT", "APPLICATION", "TRANSFORM", "FAMILIES"], rows)?;
    output.info(&format!("{} of {} reports", summaries.len(), registry.len()))
}

/// The serde name of a unit enum variant
fn serde_name<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
}
