use super::{TransformInput, TransformOutput};
use crate::json::FilterMap;
use crate::types::FilterDocument;
use serde_json::Value;

/// Work-item and assessment reports: stacks plus the clicked name
///
/// The dashboard query does not apply to these reports.
pub fn levelops(input: &TransformInput<'_>) -> TransformOutput {
    let across = input.across.to_string();
    let mut filter = FilterMap::new();
    filter.insert(
        "stacks".to_string(),
        input
            .widget
            .query
            .get("stacks")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
    );
    if let Some(name) = input.context.x_axis.display_name() {
        filter.insert(input.across_key(), Value::String(name));
    }

    TransformOutput {
        across_value: across.clone(),
        filters: FilterDocument::new(across, filter),
    }
}
