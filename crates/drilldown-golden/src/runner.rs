//! Golden test runner for executing snapshot tests

use crate::{
    corpus::{CorpusManager, MatchMode, TestCase},
    diff::DiffEngine,
    snapshot::{self, SnapshotManager},
    GoldenConfig, GoldenError, Result,
};
use colored::*;
use drilldown_core::{compile, DrillDownRequest, ReportDescriptor, ReportRegistry};
use regex::Regex;
use serde_json::Value;
use std::time::Instant;

/// Result of running a golden test
#[derive(Debug)]
pub struct TestResult {
    pub name: String,

    pub passed: bool,

    pub error: Option<String>,

    /// Diff output if comparison failed
    pub diff: Option<String>,

    pub duration_ms: u64,

    /// Whether snapshot was written
    pub updated: bool,
}

impl TestResult {
    fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            error: Some(error),
            diff: None,
            duration_ms: 0,
            updated: false,
        }
    }

    pub fn print(&self, verbose: bool) {
        let status = if self.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };

        println!("{} {} ({}ms)", status, self.name, self.duration_ms);

        if let Some(ref error) = self.error {
            println!("  {}: {}", "Error".red(), error);
        }

        if verbose || !self.passed {
            if let Some(ref diff) = self.diff {
                println!("{}", diff);
            }
        }

        if self.updated {
            println!("  {}", "Snapshot updated".yellow());
        }
    }
}

/// Outcome of executing one case before it becomes a [`TestResult`]
struct Execution {
    passed: bool,
    diff: Option<String>,
    updated: bool,
}

/// `category/*` matches one category, `*` everything, anything else is a substring
fn matches_pattern(test: &TestCase, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(category) = pattern.strip_suffix("/*") {
        return test.category == category;
    }
    test.id().contains(pattern)
}

/// Runner for golden tests
pub struct GoldenTestRunner {
    config: GoldenConfig,
    corpus_manager: CorpusManager,
    snapshot_manager: SnapshotManager,
}

impl GoldenTestRunner {
    pub fn new(config: GoldenConfig) -> Self {
        let corpus_manager = CorpusManager::new(&config.corpus_dir);
        let snapshot_manager = SnapshotManager::new(&config.snapshot_dir);

        Self {
            config,
            corpus_manager,
            snapshot_manager,
        }
    }

    /// Run a single test by `category/name`
    pub fn run_test(&self, test_name: &str) -> Result<TestResult> {
        let start = Instant::now();

        let test_path = self.config.corpus_dir.join(test_name).join("test.json");
        let test_case = self.corpus_manager.load_test_case(&test_path)?;

        let result = self.execute_test(&test_case);

        let duration_ms = start.elapsed().as_millis() as u64;

        let test_result = match result {
            Ok(execution) => TestResult {
                name: test_name.to_string(),
                passed: execution.passed,
                error: (!execution.passed).then(|| "Snapshot mismatch".to_string()),
                diff: execution.diff,
                duration_ms,
                updated: execution.updated,
            },
            Err(e) => TestResult {
                duration_ms,
                ..TestResult::failed(test_name, e.to_string())
            },
        };

        if self.config.verbose {
            test_result.print(true);
        }

        if test_result.passed {
            return Ok(test_result);
        }

        let mut message = format!(
            "Test '{}' failed: {}",
            test_name,
            test_result.error.as_deref().unwrap_or("Unknown error")
        );
        if let Some(diff) = &test_result.diff {
            message.push('\n');
            message.push_str(diff);
        }
        Err(GoldenError::TestFailed(message))
    }

    /// Run every test matching `pattern`
    pub fn run_batch(&self, pattern: &str) -> Result<Vec<TestResult>> {
        let tests = self.corpus_manager.discover_tests()?;

        let filtered_tests: Vec<_> = tests
            .into_iter()
            .filter(|t| matches_pattern(t, pattern))
            .collect();

        if filtered_tests.is_empty() {
            return Err(GoldenError::CorpusError(format!(
                "No tests found matching pattern '{}'",
                pattern
            )));
        }

        println!("Running {} tests...\n", filtered_tests.len());

        let mut results = Vec::new();
        let mut failed = 0;

        for test_case in filtered_tests {
            let test_name = test_case.id();
            let result = self
                .run_test(&test_name)
                .unwrap_or_else(|e| TestResult::failed(&test_name, e.to_string()));

            if !result.passed {
                failed += 1;
            }

            result.print(self.config.verbose);
            results.push(result);
        }

        println!("\n{}", "=== Test Summary ===".bold());
        println!(
            "{}: {} passed, {} failed",
            "Results".bold(),
            (results.len() - failed).to_string().green(),
            failed.to_string().red()
        );

        if failed > 0 {
            Err(GoldenError::TestFailed(format!("{} test(s) failed", failed)))
        } else {
            Ok(results)
        }
    }

    fn execute_test(&self, test_case: &TestCase) -> Result<Execution> {
        if !test_case.metadata.enabled {
            return Ok(Execution {
                passed: true,
                diff: None,
                updated: false,
            });
        }

        let expectations = &test_case.expectations;
        let compiled = match self.perform_compile(test_case) {
            Ok(value) if expectations.should_succeed => value,
            Ok(_) => {
                return Err(GoldenError::TestFailed(
                    "Request compiled but was expected to fail".to_string(),
                ))
            }
            Err(e) if !expectations.should_succeed => {
                return self.check_expected_error(&e, expectations.error_pattern.as_deref());
            }
            Err(e) => return Err(e),
        };

        let snapshot_name = test_case.id();

        if !self.snapshot_manager.exists(&snapshot_name) {
            if self.config.create_missing || self.config.update_snapshots {
                self.snapshot_manager.create(
                    &snapshot_name,
                    compiled,
                    Some(test_case.metadata.description.clone()),
                )?;

                return Ok(Execution {
                    passed: true,
                    diff: None,
                    updated: true,
                });
            }
            return Err(GoldenError::SnapshotMismatch(format!(
                "Snapshot '{}' does not exist. Run with UPDATE_GOLDEN=1 to create it.",
                snapshot_name
            )));
        }

        let stored = self.snapshot_manager.load(&snapshot_name)?;

        let mut diff_engine = DiffEngine::new(self.config.diff_options.clone());
        for volatile in &expectations.volatile_fields {
            diff_engine.add_volatile_pattern(&volatile.path, &volatile.pattern)?;
        }

        let ignore_fields: Vec<String> = stored
            .ignore_fields
            .iter()
            .chain(&expectations.ignore_fields)
            .cloned()
            .collect();

        let mut expected = stored.content.clone();
        let mut actual = match expectations.match_mode {
            MatchMode::Exact => compiled.clone(),
            MatchMode::Subset => snapshot::project_onto(&compiled, &expected),
        };

        snapshot::apply_ignores(&mut expected, &ignore_fields);
        snapshot::apply_ignores(&mut actual, &ignore_fields);

        let diff_result = diff_engine.compare(&expected, &actual);

        if diff_result.matches {
            Ok(Execution {
                passed: true,
                diff: None,
                updated: false,
            })
        } else if self.config.update_snapshots {
            // A subset snapshot keeps its shape; only the compared keys are refreshed
            let refreshed = match expectations.match_mode {
                MatchMode::Exact => compiled,
                MatchMode::Subset => actual,
            };
            self.snapshot_manager.backup(&snapshot_name)?;
            self.snapshot_manager.update(&snapshot_name, refreshed)?;
            Ok(Execution {
                passed: true,
                diff: Some(diff_result.diff_output),
                updated: true,
            })
        } else {
            Ok(Execution {
                passed: false,
                diff: Some(diff_result.diff_output),
                updated: false,
            })
        }
    }

    fn check_expected_error(&self, error: &GoldenError, pattern: Option<&str>) -> Result<Execution> {
        let message = error.to_string();
        if let Some(pattern) = pattern {
            let regex = Regex::new(pattern)
                .map_err(|e| GoldenError::CorpusError(format!("Invalid error pattern: {}", e)))?;
            if !regex.is_match(&message) {
                return Err(GoldenError::TestFailed(format!(
                    "Error '{}' does not match '{}'",
                    message, pattern
                )));
            }
        }
        Ok(Execution {
            passed: true,
            diff: None,
            updated: false,
        })
    }

    /// Parse the case's request and compile it against the built-in registry
    fn perform_compile(&self, test_case: &TestCase) -> Result<Value> {
        let request = DrillDownRequest::from_value(test_case.input.request.clone())?;

        let mut registry = ReportRegistry::builtin();
        if let Some(extra) = &test_case.input.registry {
            let descriptors: Vec<ReportDescriptor> = serde_json::from_value(extra.clone())?;
            registry.extend(descriptors)?;
        }

        Ok(compile(&request, &registry).to_value())
    }

    pub fn init_corpus(&self) -> Result<()> {
        self.corpus_manager.init_corpus()
    }

    /// List all available tests as `category/name`
    pub fn list_tests(&self) -> Result<Vec<String>> {
        let tests = self.corpus_manager.discover_tests()?;
        Ok(tests.iter().map(TestCase::id).collect())
    }

    pub fn get_statistics(&self) -> Result<()> {
        let stats = self.corpus_manager.get_statistics()?;
        stats.print();
        Ok(())
    }
}
