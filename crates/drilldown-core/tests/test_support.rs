//! Shared test support utilities for integration tests

#![allow(dead_code)]

use drilldown_core::{compile, DrillDownRequest, DrilldownOutcome, FilterDocument, ReportRegistry};
use serde_json::{json, Map, Value};

/// Builds drill-down requests as JSON, one section at a time
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    value: Value,
}

fn section<'a>(value: &'a mut Value, key: &str) -> &'a mut Map<String, Value> {
    let root = value.as_object_mut().expect("request is an object");
    root.entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .expect("request section is an object")
}

impl RequestBuilder {
    pub fn new(report_type: &str, application: &str) -> Self {
        Self {
            value: json!({
                "context": {"application": application},
                "widget": {"type": report_type, "query": {}}
            }),
        }
    }

    /// Set the across on both the click and the widget query
    pub fn across(mut self, across: &str) -> Self {
        section(&mut self.value, "context").insert("across".into(), json!(across));
        self.query("across", json!(across))
    }

    pub fn x_axis(mut self, x_axis: Value) -> Self {
        section(&mut self.value, "context").insert("x_axis".into(), x_axis);
        self
    }

    pub fn context(mut self, key: &str, value: Value) -> Self {
        section(&mut self.value, "context").insert(key.into(), value);
        self
    }

    pub fn query(mut self, key: &str, value: Value) -> Self {
        let widget = section(&mut self.value, "widget");
        widget
            .get_mut("query")
            .and_then(Value::as_object_mut)
            .expect("widget query is an object")
            .insert(key.into(), value);
        self
    }

    pub fn dashboard_query(mut self, key: &str, value: Value) -> Self {
        section(&mut self.value, "dashboard_query").insert(key.into(), value);
        self
    }

    pub fn metadata(mut self, key: &str, value: Value) -> Self {
        section(&mut self.value, "metadata").insert(key.into(), value);
        self
    }

    pub fn dashboard_metadata(mut self, key: &str, value: Value) -> Self {
        section(&mut self.value, "dashboard_metadata").insert(key.into(), value);
        self
    }

    pub fn query_param_ou(mut self, ou: &str) -> Self {
        self.value["query_param_ou"] = json!(ou);
        self
    }

    pub fn now(mut self, secs: i64) -> Self {
        self.value["now"] = json!(secs);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn build(self) -> DrillDownRequest {
        DrillDownRequest::from_value(self.value).expect("valid drill-down request")
    }
}

/// Compile against the built-in registry
pub fn compile_builtin(request: &DrillDownRequest) -> DrilldownOutcome {
    compile(request, &ReportRegistry::builtin())
}

/// Compile and return the filter document, failing on an empty outcome
pub fn compiled_filters(builder: RequestBuilder) -> FilterDocument {
    let outcome = compile_builtin(&builder.build());
    outcome
        .compiled()
        .map(|c| c.filters.clone())
        .expect("report should be drillable")
}
