//! Benchmarks for drill-down compilation
//!
//! Covers registry construction, request parsing and full compilation for
//! a handful of representative report families.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use drilldown_core::{compile, DrillDownRequest, ReportRegistry};
use serde_json::{json, Value};

fn levelops_state_click() -> Value {
    json!({
        "context": {
            "application": "levelops",
            "across": "state",
            "x_axis": {"name": "NEW", "id": "27"}
        },
        "widget": {"type": "levelops_workitem_count_report", "query": {"across": "state"}},
        "dashboard_query": {"product_id": "80", "integration_ids": ["4", "12"]},
        "metadata": {"widget_type": "graph"}
    })
}

fn week_number_tickets() -> Value {
    json!({
        "context": {"application": "jira", "across": "issue_created", "x_axis": "3-2024"},
        "widget": {
            "type": "tickets_report",
            "query": {"across": "issue_created", "interval": "week"}
        },
        "metadata": {"weekdate_format": "number"}
    })
}

fn azure_priority() -> Value {
    json!({
        "context": {"application": "azure_devops", "across": "priority", "x_axis": "High"},
        "widget": {
            "type": "azure_tickets_report",
            "query": {"across": "priority", "custom_fields": {"Custom.Team": ["Platform"]}}
        },
        "dashboard_metadata": {"ou_ids": ["1"]}
    })
}

fn scenarios() -> Vec<(&'static str, Value)> {
    vec![
        ("levelops_state", levelops_state_click()),
        ("tickets_week_number", week_number_tickets()),
        ("azure_priority", azure_priority()),
    ]
}

fn bench_registry(c: &mut Criterion) {
    c.bench_function("registry_builtin", |b| {
        b.iter(|| black_box(ReportRegistry::builtin()))
    });
}

fn bench_request_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parsing");

    for (name, value) in scenarios() {
        let text = value.to_string();
        group.bench_with_input(BenchmarkId::new("from_json", name), &text, |b, text| {
            b.iter(|| {
                let request = DrillDownRequest::from_json(black_box(text));
                black_box(request)
            })
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let registry = ReportRegistry::builtin();

    for (name, value) in scenarios() {
        let Ok(request) = DrillDownRequest::from_value(value) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("report", name), &request, |b, request| {
            b.iter(|| black_box(compile(black_box(request), &registry)))
        });
    }

    group.finish();
}

fn bench_compile_to_value(c: &mut Criterion) {
    let registry = ReportRegistry::builtin();
    let Ok(request) = DrillDownRequest::from_value(levelops_state_click()) else {
        return;
    };

    c.bench_function("compile_to_value", |b| {
        b.iter(|| black_box(compile(&request, &registry).to_value()))
    });
}

criterion_group!(
    benches,
    bench_registry,
    bench_request_parsing,
    bench_compile,
    bench_compile_to_value
);

criterion_main!(benches);
