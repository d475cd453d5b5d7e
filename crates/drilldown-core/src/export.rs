//! Tabular export of drill-down results
//!
//! The drill-down table can be downloaded as rows. A [`TabularTransformer`]
//! turns the API records behind the table into one row per record; the
//! registry names which transformer a report uses.

use crate::json::scalar_string;
use crate::registry::ReportRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transformers a descriptor can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabularKind {
    #[default]
    ColumnProjection,
    /// Lead-time tables with one column per stage
    LeadTimeStages,
}

impl TabularKind {
    pub fn transformer(self) -> Box<dyn TabularTransformer> {
        match self {
            TabularKind::ColumnProjection => Box::new(ColumnProjection),
            TabularKind::LeadTimeStages => Box::new(LeadTimeStages),
        }
    }
}

/// One table column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularColumn {
    pub title: String,
    #[serde(alias = "dataIndex")]
    pub data_index: Option<String>,
    pub key: Option<String>,
}

impl TabularColumn {
    /// Record field the column reads
    pub fn field(&self) -> Option<&str> {
        self.data_index.as_deref().or(self.key.as_deref())
    }
}

/// The table to export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularInput {
    #[serde(alias = "apiData")]
    pub api_data: Vec<Value>,
    pub columns: Vec<TabularColumn>,
    /// Header overrides for columns rendered by the UI
    #[serde(alias = "jsxHeaders")]
    pub jsx_headers: Vec<TabularColumn>,
}

/// Turns API records into export rows
pub trait TabularTransformer {
    fn transform(&self, input: &TabularInput) -> Vec<Vec<Value>>;

    /// The header row; `jsx_headers` win over column titles
    fn headers(&self, input: &TabularInput) -> Vec<Value> {
        input
            .columns
            .iter()
            .map(|column| {
                let title = column
                    .field()
                    .and_then(|field| {
                        input
                            .jsx_headers
                            .iter()
                            .find(|header| header.field() == Some(field))
                    })
                    .map_or(column.title.as_str(), |header| header.title.as_str());
                Value::String(title.to_string())
            })
            .collect()
    }
}

/// Reads each column's field from every record
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnProjection;

impl TabularTransformer for ColumnProjection {
    fn transform(&self, input: &TabularInput) -> Vec<Vec<Value>> {
        input
            .api_data
            .iter()
            .map(|record| {
                input
                    .columns
                    .iter()
                    .map(|column| cell(column.field().and_then(|f| record.get(f))))
                    .collect()
            })
            .collect()
    }
}

/// Column projection that also resolves stage columns
///
/// Lead-time records carry their stages as `data: [{key, mean}]`. A column
/// with no top-level field in the record is looked up there, and the stage's
/// mean (seconds) is exported in days.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadTimeStages;

impl TabularTransformer for LeadTimeStages {
    fn transform(&self, input: &TabularInput) -> Vec<Vec<Value>> {
        input
            .api_data
            .iter()
            .map(|record| {
                input
                    .columns
                    .iter()
                    .map(|column| match column.field() {
                        Some(field) if record.get(field).is_some() => cell(record.get(field)),
                        Some(field) => stage_days(record, field),
                        None => cell(None),
                    })
                    .collect()
            })
            .collect()
    }
}

fn stage_days(record: &Value, stage: &str) -> Value {
    let mean = record
        .get("data")
        .and_then(Value::as_array)
        .and_then(|stages| {
            stages
                .iter()
                .find(|s| s.get("key").and_then(Value::as_str) == Some(stage))
        })
        .and_then(|s| s.get("mean"))
        .and_then(Value::as_f64);
    match mean {
        Some(seconds) => Value::from((seconds / 864.0).round() / 100.0),
        None => cell(None),
    }
}

fn cell(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(Value::Array(items)) => Value::String(
            items
                .iter()
                .map(|item| scalar_string(item).unwrap_or_else(|| item.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Some(Value::Object(map)) => Value::String(Value::Object(map.clone()).to_string()),
        Some(other) => other.clone(),
    }
}

/// Transformer for `report_type`, falling back to [`ColumnProjection`]
pub fn transformer_for(registry: &ReportRegistry, report_type: &str) -> Box<dyn TabularTransformer> {
    registry
        .get(report_type)
        .and_then(|descriptor| descriptor.tabular)
        .unwrap_or_default()
        .transformer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ReportDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn input() -> TabularInput {
        serde_json::from_value(json!({
            "apiData": [
                {"key": "LEV-1", "labels": ["a", "b"], "story_points": 3},
                {"key": "LEV-2", "assignee": null}
            ],
            "columns": [
                {"title": "Key", "dataIndex": "key"},
                {"title": "Labels", "key": "labels"},
                {"title": "Assignee", "dataIndex": "assignee"},
                {"title": "Points", "dataIndex": "story_points"}
            ],
            "jsxHeaders": [{"title": "Issue", "key": "key"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_column_projection() {
        let rows = ColumnProjection.transform(&input());
        assert_eq!(
            rows,
            vec![
                vec![json!("LEV-1"), json!("a, b"), json!(""), json!(3)],
                vec![json!("LEV-2"), json!(""), json!(""), json!("")],
            ]
        );
    }

    #[test]
    fn test_headers_prefer_jsx_titles() {
        assert_eq!(
            ColumnProjection.headers(&input()),
            vec![json!("Issue"), json!("Labels"), json!("Assignee"), json!("Points")]
        );
    }

    #[test]
    fn test_lead_time_stage_columns() {
        let input: TabularInput = serde_json::from_value(json!({
            "api_data": [{"key": "LEV-1", "data": [{"key": "In Review", "mean": 172800}]}],
            "columns": [{"title": "Key", "data_index": "key"}, {"title": "In Review", "key": "In Review"}, {"title": "QA", "key": "QA"}]
        }))
        .unwrap();
        assert_eq!(
            LeadTimeStages.transform(&input),
            vec![vec![json!("LEV-1"), json!(2.0), json!("")]]
        );
    }

    #[test]
    fn test_registry_selection() {
        let mut registry = ReportRegistry::new();
        registry.register(
            ReportDescriptor::builder("lead_time_by_stage_report", "jira")
                .tabular(TabularKind::LeadTimeStages)
                .build(),
        );
        let input = TabularInput {
            api_data: vec![json!({"key": "LEV-1", "data": [{"key": "Dev", "mean": 86400}]})],
            columns: vec![TabularColumn {
                title: "Dev".to_string(),
                key: Some("Dev".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(transformer_for(&registry, "lead_time_by_stage_report").transform(&input), vec![vec![json!(1.0)]]);
        assert_eq!(transformer_for(&registry, "unknown").transform(&input), vec![vec![json!("")]]);
    }
}
