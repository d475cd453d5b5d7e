//! Request and output types for drill-down compilation
//!
//! Inputs mirror what the dashboard sends when a chart element is clicked.
//! Field names follow the wire format, which mixes snake_case with a few
//! camelCase names; those are accepted through serde aliases.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::json::{scalar_string, FilterMap};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// The clicked chart element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum XAxis {
    /// A category or date label such as `"NEW"` or `"15 Jan 2024"`
    Label(String),
    /// Unix seconds
    Epoch(i64),
    /// A structured point, e.g. `{"name": "NEW", "id": "27"}`
    Point(FilterMap),
    #[default]
    Missing,
}

impl XAxis {
    /// The textual value of a label or epoch x-axis
    pub fn label(&self) -> Option<String> {
        match self {
            XAxis::Label(s) => Some(s.clone()),
            XAxis::Epoch(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The point object, if the x-axis is structured
    pub fn point(&self) -> Option<&FilterMap> {
        match self {
            XAxis::Point(map) => Some(map),
            _ => None,
        }
    }

    /// The point object, also accepting a label that holds serialized JSON
    pub fn point_lenient(&self) -> Option<FilterMap> {
        match self {
            XAxis::Point(map) => Some(map.clone()),
            XAxis::Label(s) => serde_json::from_str::<Value>(s)
                .ok()
                .and_then(|v| v.as_object().cloned()),
            _ => None,
        }
    }

    /// A scalar field of the point rendered as a string
    pub fn point_field(&self, key: &str) -> Option<String> {
        self.point().and_then(|p| p.get(key)).and_then(scalar_string)
    }

    /// Value used when the click names a category
    ///
    /// Points contribute `key`, then `id`, then `name`.
    pub fn clicked_value(&self) -> Option<String> {
        match self {
            XAxis::Point(_) => self
                .point_field("key")
                .or_else(|| self.point_field("id"))
                .or_else(|| self.point_field("name")),
            other => other.label(),
        }
    }

    /// Display name: a point's `name`, otherwise the label
    pub fn display_name(&self) -> Option<String> {
        match self {
            XAxis::Point(_) => self.point_field("name"),
            other => other.label(),
        }
    }

    /// The raw JSON form of the x-axis
    pub fn to_value(&self) -> Value {
        match self {
            XAxis::Label(s) => Value::String(s.clone()),
            XAxis::Epoch(n) => Value::from(*n),
            XAxis::Point(map) => Value::Object(map.clone()),
            XAxis::Missing => Value::Null,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, XAxis::Missing)
    }
}

/// A custom field the integration exposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CustomFieldDef {
    pub name: String,
    pub field_key: String,
    pub field_type: Option<String>,
    /// Integration-side flags, e.g. `{"transformed": "..."}`
    pub metadata: FilterMap,
}

impl CustomFieldDef {
    /// Azure fields whose values are stored under the bare field name
    pub fn is_transformed(&self) -> bool {
        match self.metadata.get("transformed") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(_) => true,
        }
    }

    /// Date-typed fields cannot be partially matched
    pub fn is_date(&self) -> bool {
        matches!(
            self.field_type.as_deref(),
            Some("date") | Some("datetime") | Some("dateTime")
        )
    }
}

/// An integration available to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IntegrationRef {
    pub id: String,
    pub application: String,
}

/// Click context sent by the chart
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DrillDownContext {
    pub application: String,
    pub x_axis: XAxis,
    /// Across the chart was grouped by. Falls back to `widget.query.across`.
    pub across: Option<String>,
    #[serde(alias = "widgetId")]
    pub widget_id: Option<String>,
    #[serde(alias = "dashboardId")]
    pub dashboard_id: Option<String>,
    #[serde(alias = "widgetMetaData")]
    pub widget_metadata: FilterMap,
    #[serde(alias = "supportedCustomFields")]
    pub supported_custom_fields: Vec<CustomFieldDef>,
    #[serde(alias = "availableIntegrations")]
    pub available_integrations: Option<Vec<IntegrationRef>>,
    #[serde(alias = "scmGlobalSettings")]
    pub scm_global_settings: FilterMap,
    #[serde(alias = "doraProfileIntegrationType")]
    pub dora_profile_integration_type: Option<String>,
    #[serde(alias = "additionFilter")]
    pub addition_filter: FilterMap,
    #[serde(alias = "stackFilters")]
    pub stack_filters: Vec<String>,
    /// Per-application click data, e.g. `{"jira": {"additional_data": ..}}`
    #[serde(flatten)]
    pub extra: FilterMap,
}

/// The widget the click came from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WidgetDescriptor {
    #[serde(rename = "type")]
    pub report_type: String,
    pub query: FilterMap,
    pub metadata: FilterMap,
}

impl WidgetDescriptor {
    pub fn query_str(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(Value::as_str)
    }
}

/// Dashboard-wide metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashboardMetadata {
    pub ou_ids: Vec<String>,
    pub ou_user_filter_designation: FilterMap,
    /// Either `{"$gt", "$lt"}` or a relative name such as `last_30_days`
    pub dashboard_time_range_filter: Option<Value>,
    pub jira_or_query: FilterMap,
    pub effort_investment_profile: bool,
    pub effort_investment_profile_filter: Option<Value>,
    #[serde(flatten)]
    pub extra: FilterMap,
}

/// Everything a single compilation reads
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DrillDownRequest {
    #[serde(alias = "drillDownProps")]
    pub context: DrillDownContext,
    pub widget: WidgetDescriptor,
    #[serde(alias = "dashboardQuery")]
    pub dashboard_query: FilterMap,
    /// Report metadata: `weekdate_format`, `dashBoard_time_keys`, ...
    #[serde(alias = "metaData")]
    pub metadata: FilterMap,
    #[serde(alias = "dashboardMetadata")]
    pub dashboard_metadata: DashboardMetadata,
    #[serde(alias = "queryParamOU")]
    pub query_param_ou: Option<String>,
    #[serde(alias = "contextFilters")]
    pub context_filters: FilterMap,
    /// Unix seconds used wherever compilation needs "now"
    pub now: Option<i64>,
}

impl DrillDownRequest {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_yaml(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Validation {
                field: "request".to_string(),
                message: "a drill-down request must be a JSON object".to_string(),
                expected: Some("object".to_string()),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The across the chart was grouped by
    pub fn requested_across(&self) -> String {
        self.context
            .across
            .clone()
            .or_else(|| self.widget.query_str("across").map(str::to_string))
            .unwrap_or_default()
    }

    /// `weekdate_format` from report metadata
    pub fn week_format(&self) -> Option<&str> {
        self.metadata.get("weekdate_format").and_then(Value::as_str)
    }
}

/// The filter document sent to the aggregation API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub across: Option<String>,
    #[serde(default)]
    pub filter: FilterMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ou_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ou_user_filter_designation: Option<FilterMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ou_exclusions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_ou_on_velocity_report: Option<Value>,
    /// Other top-level keys such as `stacks` or `sort`
    #[serde(flatten)]
    pub extra: FilterMap,
}

impl FilterDocument {
    pub fn new(across: impl Into<String>, filter: FilterMap) -> Self {
        Self {
            across: Some(across.into()),
            filter,
            ..Default::default()
        }
    }

    pub fn across(&self) -> &str {
        self.across.as_deref().unwrap_or_default()
    }
}

/// A compiled drill-down
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDrilldown {
    pub across_value: String,
    pub filters: FilterDocument,
}

/// Result of compiling one request
#[derive(Debug, Clone, PartialEq)]
pub enum DrilldownOutcome {
    /// The report is not drillable; serializes as `{}`
    Empty,
    Composed(CompiledDrilldown),
}

impl DrilldownOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, DrilldownOutcome::Empty)
    }

    pub fn compiled(&self) -> Option<&CompiledDrilldown> {
        match self {
            DrilldownOutcome::Composed(c) => Some(c),
            DrilldownOutcome::Empty => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(FilterMap::new()))
    }
}

impl Serialize for DrilldownOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DrilldownOutcome::Empty => serializer.serialize_map(Some(0))?.end(),
            DrilldownOutcome::Composed(compiled) => compiled.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_x_axis_variants() {
        let label: XAxis = serde_json::from_value(json!("NEW")).unwrap();
        assert_eq!(label, XAxis::Label("NEW".into()));

        let epoch: XAxis = serde_json::from_value(json!(1705276800)).unwrap();
        assert_eq!(epoch, XAxis::Epoch(1_705_276_800));

        let point: XAxis = serde_json::from_value(json!({"name": "NEW", "id": "27"})).unwrap();
        assert_eq!(point.clicked_value().as_deref(), Some("27"));
        assert_eq!(point.display_name().as_deref(), Some("NEW"));
    }

    #[test]
    fn test_x_axis_lenient_point() {
        let x = XAxis::Label(r#"{"id": 1700000000, "stage": "QA"}"#.into());
        let point = x.point_lenient().unwrap();
        assert_eq!(point["stage"], json!("QA"));
        assert!(XAxis::Label("NEW".into()).point_lenient().is_none());
    }

    #[test]
    fn test_request_camel_case_aliases() {
        let request = DrillDownRequest::from_value(json!({
            "drillDownProps": {
                "application": "jira",
                "x_axis": "NEW",
                "widgetMetaData": {"disable_or_filters": true}
            },
            "widget": {"type": "tickets_report", "query": {"across": "status"}},
            "queryParamOU": "42"
        }))
        .unwrap();

        assert_eq!(request.context.application, "jira");
        assert_eq!(request.widget.report_type, "tickets_report");
        assert_eq!(request.requested_across(), "status");
        assert_eq!(request.query_param_ou.as_deref(), Some("42"));
        assert_eq!(request.context.widget_metadata["disable_or_filters"], json!(true));
    }

    #[test]
    fn test_request_must_be_object() {
        assert!(DrillDownRequest::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_empty_outcome_serializes_to_empty_object() {
        assert_eq!(DrilldownOutcome::Empty.to_value(), json!({}));
    }

    #[test]
    fn test_composed_outcome_shape() {
        let mut filter = FilterMap::new();
        filter.insert("status".into(), json!("NEW"));
        let outcome = DrilldownOutcome::Composed(CompiledDrilldown {
            across_value: "state".into(),
            filters: FilterDocument::new("state", filter),
        });
        assert_eq!(
            outcome.to_value(),
            json!({"acrossValue": "state", "filters": {"across": "state", "filter": {"status": "NEW"}}})
        );
    }
}
