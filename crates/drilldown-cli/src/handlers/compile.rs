//! Compile command handler

use super::utils::{is_yaml, load_registry, load_request};
use crate::cli::CompileArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use drilldown_core::{compile, DrilldownOutcome};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Handle the compile command
///
/// A report that cannot be drilled into still succeeds and prints `{}`.
#[instrument(skip_all, fields(requests = args.requests.len()))]
pub fn handle_compile(args: CompileArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("compile_command", &format!("{} request(s)", args.requests.len()));

    let registry = load_registry(&args.registry, config)?;
    debug!(reports = registry.len(), "Registry ready");

    let now = args.now.or(config.default_now);
    let spinner = if args.requests.len() > 1 {
        output.spinner("Compiling drill-downs...")
    } else {
        None
    };

    let mut results: Vec<(PathBuf, DrilldownOutcome)> = Vec::with_capacity(args.requests.len());
    for path in &args.requests {
        if let Some(pb) = &spinner {
            pb.set_message(format!("Compiling {}", path.display()));
        }

        let mut request = load_request(path)?;
        if request.now.is_none() {
            request.now = now;
        }

        let outcome = compile(&request, &registry);
        info!(
            path = %path.display(),
            report_type = %request.widget.report_type,
            empty = outcome.is_empty(),
            "Compiled drill-down"
        );
        results.push((path.clone(), outcome));
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match &args.save_to {
        Some(target) => {
            save_results(target, &results)?;
            output.success(&format!("✓ Saved compiled output to {}", target.display()))?;
        }
        None => write_results(output, &results)?,
    }

    debug!(elapsed_ms = timer.elapsed().as_millis() as u64, "Compile finished");
    Ok(())
}

fn write_results(output: &mut OutputWriter, results: &[(PathBuf, DrilldownOutcome)]) -> Result<()> {
    match results {
        [(_, outcome)] => output.outcome(outcome),
        _ if output.format() == crate::cli::OutputFormat::Human => {
            for (path, outcome) in results {
                output.section(&path.display().to_string())?;
                output.outcome(outcome)?;
            }
            Ok(())
        }
        _ => output.data(&keyed_by_path(results)),
    }
}

/// One request saves its outcome; several save an object keyed by path
fn save_results(target: &Path, results: &[(PathBuf, DrilldownOutcome)]) -> Result<()> {
    let value = match results {
        [(_, outcome)] => outcome.to_value(),
        _ => keyed_by_path(results),
    };

    let mut content = if is_yaml(target) {
        serde_yaml::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    if !content.ends_with('\n') {
        content.push('\n');
    }

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(target, content)?;
    Ok(())
}

fn keyed_by_path(results: &[(PathBuf, DrilldownOutcome)]) -> Value {
    let map: Map<String, Value> = results
        .iter()
        .map(|(path, outcome)| (path.display().to_string(), outcome.to_value()))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_request(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn levelops_click() -> Value {
        json!({
            "context": {"application": "levelops", "across": "state", "x_axis": {"name": "NEW", "id": "27"}},
            "widget": {"type": "levelops_workitem_count_report", "query": {"across": "state"}}
        })
    }

    fn quiet_writer() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_compile_saves_single_outcome() {
        let dir = TempDir::new().unwrap();
        let request = write_request(dir.path(), "click.json", levelops_click());
        let target = dir.path().join("out").join("compiled.json");

        let args = CompileArgs {
            requests: vec![request],
            registry: Vec::new(),
            save_to: Some(target.clone()),
            now: None,
        };
        handle_compile(args, &Config::default(), &mut quiet_writer()).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(target).unwrap()).unwrap();
        assert_eq!(
            saved,
            json!({
                "acrossValue": "state",
                "filters": {"across": "state", "filter": {"stacks": [], "status": "NEW"}}
            })
        );
    }

    #[test]
    fn test_compile_several_requests_keyed_by_path() {
        let dir = TempDir::new().unwrap();
        let first = write_request(dir.path(), "a.json", levelops_click());
        let second = write_request(
            dir.path(),
            "b.json",
            json!({"context": {"application": "jira"}, "widget": {"type": "jira_zendesk_report"}}),
        );
        let target = dir.path().join("all.yaml");

        let args = CompileArgs {
            requests: vec![first.clone(), second.clone()],
            registry: Vec::new(),
            save_to: Some(target.clone()),
            now: None,
        };
        handle_compile(args, &Config::default(), &mut quiet_writer()).unwrap();

        let saved: Value = serde_yaml::from_str(&fs::read_to_string(target).unwrap()).unwrap();
        assert_eq!(saved[first.display().to_string()]["acrossValue"], "state");
        assert_eq!(saved[second.display().to_string()], json!({}));
    }

    #[test]
    fn test_compile_uses_default_now() {
        let dir = TempDir::new().unwrap();
        let request = write_request(
            dir.path(),
            "stat.json",
            json!({
                "context": {"application": "jira_stat"},
                "widget": {"type": "tickets_counts_stat", "query": {"time_period": 7}}
            }),
        );
        let target = dir.path().join("stat-out.json");
        let config = Config {
            default_now: Some(1_700_000_000),
            ..Config::default()
        };

        let args = CompileArgs {
            requests: vec![request],
            registry: Vec::new(),
            save_to: Some(target.clone()),
            now: None,
        };
        handle_compile(args, &config, &mut quiet_writer()).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(target).unwrap()).unwrap();
        assert_eq!(
            saved["filters"]["filter"]["issue_updated_at"],
            json!({"$gt": "1699395200", "$lt": "1700000000"})
        );
    }

    #[test]
    fn test_compile_missing_request() {
        let args = CompileArgs {
            requests: vec![PathBuf::from("/nonexistent/click.json")],
            registry: Vec::new(),
            save_to: None,
            now: None,
        };
        let err = handle_compile(args, &Config::default(), &mut quiet_writer()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
