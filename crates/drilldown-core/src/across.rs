//! Across-value resolution
//!
//! The "across" is the dimension a chart groups by. The click names it in
//! UI terms (`assignee`, `status`); the backend filters on a different key
//! (`assignees`, `statuses`).

use crate::constants::{values_to_filters, HYGIENE_ACROSS_REPORTS};
use crate::registry::ReportDescriptor;
use crate::types::WidgetDescriptor;

/// The across value used for compilation
///
/// Hygiene reports always group by what their saved query says, whatever
/// the click reports.
pub fn resolve(requested: &str, widget: &WidgetDescriptor) -> String {
    if HYGIENE_ACROSS_REPORTS.contains(&widget.report_type.as_str()) {
        return widget.query_str("across").unwrap_or_default().to_string();
    }
    requested.to_string()
}

/// Backend filter key for an across value
///
/// The descriptor's own map wins over the global table; unknown acrosses
/// map to themselves.
pub fn filter_key(across: &str, descriptor: &ReportDescriptor) -> String {
    descriptor
        .across_key_map
        .get(across)
        .map(String::as_str)
        .or_else(|| values_to_filters(across))
        .unwrap_or(across)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget(report_type: &str, query: serde_json::Value) -> WidgetDescriptor {
        WidgetDescriptor {
            report_type: report_type.to_string(),
            query: query.as_object().cloned().unwrap_or_default(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_resolve_passes_through() {
        let w = widget("tickets_report", json!({"across": "assignee"}));
        assert_eq!(resolve("status", &w), "status");
    }

    #[test]
    fn test_resolve_hygiene_uses_widget_query() {
        let w = widget("hygiene_report", json!({"across": "project"}));
        assert_eq!(resolve("status", &w), "project");

        let w = widget("azure_hygiene_report", json!({}));
        assert_eq!(resolve("status", &w), "");
    }

    #[test]
    fn test_filter_key_precedence() {
        let descriptor = ReportDescriptor::builder("levelops_workitem_count_report", "levelops")
            .across_key("state", "status")
            .across_key("assignee", "assignee_user_ids")
            .build();
        assert_eq!(filter_key("state", &descriptor), "status");
        assert_eq!(filter_key("assignee", &descriptor), "assignee_user_ids");
        assert_eq!(filter_key("priority", &descriptor), "priorities");
        assert_eq!(filter_key("customfield_100", &descriptor), "customfield_100");
    }
}
