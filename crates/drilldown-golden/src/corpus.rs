//! Test corpus management for golden tests
//!
//! Each case lives in `<corpus>/<category>/<name>/test.json`. The request
//! and the optional registry extension may be inlined or given as the name
//! of a sibling `.json` file.

use crate::{GoldenError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A test case in the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    pub category: String,

    pub input: TestInput,

    #[serde(default)]
    pub expectations: TestExpectations,

    pub metadata: TestMetadata,
}

impl TestCase {
    /// `category/name`, the key used for snapshots and batch matching
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

/// Input for a test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestInput {
    /// The drill-down request, inline or as a file reference
    pub request: Value,

    /// Descriptors merged into the built-in registry before compiling
    #[serde(default)]
    pub registry: Option<Value>,
}

/// How the compiled output is compared with the snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Output and snapshot must be equal
    #[default]
    Exact,
    /// Only the keys present in the snapshot are compared
    Subset,
}

/// Expected behavior for a test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExpectations {
    /// Whether the request should parse and compile
    #[serde(default = "default_true")]
    pub should_succeed: bool,

    /// Expected error pattern if should_succeed is false
    #[serde(default)]
    pub error_pattern: Option<String>,

    #[serde(default)]
    pub match_mode: MatchMode,

    /// Fields to ignore in comparison
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    #[serde(default)]
    pub volatile_fields: Vec<VolatileFieldSpec>,
}

impl Default for TestExpectations {
    fn default() -> Self {
        Self {
            should_succeed: true,
            error_pattern: None,
            match_mode: MatchMode::Exact,
            ignore_fields: Vec::new(),
            volatile_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatileFieldSpec {
    pub path: String,
    pub pattern: String,
}

/// Metadata about a test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMetadata {
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Priority level (lower = higher priority)
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u32 {
    100
}

/// Manages the test corpus
pub struct CorpusManager {
    corpus_dir: PathBuf,
}

impl CorpusManager {
    pub fn new(corpus_dir: impl AsRef<Path>) -> Self {
        Self {
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
        }
    }

    /// Discover all test cases in the corpus, highest priority first
    pub fn discover_tests(&self) -> Result<Vec<TestCase>> {
        let mut tests = Vec::new();

        if !self.corpus_dir.exists() {
            return Ok(tests);
        }

        for entry in WalkDir::new(&self.corpus_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() && path.file_name() == Some(std::ffi::OsStr::new("test.json")) {
                match self.load_test_case(path) {
                    Ok(test_case) => tests.push(test_case),
                    Err(e) => {
                        eprintln!("Warning: Failed to load test case {:?}: {}", path, e);
                    }
                }
            }
        }

        tests.sort_by(|a, b| {
            a.metadata
                .priority
                .cmp(&b.metadata.priority)
                .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(tests)
    }

    /// Load a specific test case, resolving file references next to it
    pub fn load_test_case(&self, path: &Path) -> Result<TestCase> {
        let content = fs::read_to_string(path)?;
        let mut test_case: TestCase = serde_json::from_str(&content)?;

        let test_dir = path.parent().ok_or_else(|| {
            GoldenError::CorpusError(format!("Test case {:?} has no parent directory", path))
        })?;

        if let Some(value) = resolve_reference(test_dir, &test_case.input.request)? {
            test_case.input.request = value;
        }

        if let Some(registry) = &test_case.input.registry {
            if let Some(value) = resolve_reference(test_dir, registry)? {
                test_case.input.registry = Some(value);
            }
        }

        Ok(test_case)
    }

    /// Filter tests by category
    pub fn filter_by_category(&self, tests: Vec<TestCase>, category: &str) -> Vec<TestCase> {
        tests
            .into_iter()
            .filter(|t| t.category == category || category == "*")
            .collect()
    }

    /// Filter tests by tags
    pub fn filter_by_tags(&self, tests: Vec<TestCase>, tags: &[String]) -> Vec<TestCase> {
        if tags.is_empty() {
            return tests;
        }

        tests
            .into_iter()
            .filter(|t| tags.iter().any(|tag| t.metadata.tags.contains(tag)))
            .collect()
    }

    pub fn filter_enabled(&self, tests: Vec<TestCase>) -> Vec<TestCase> {
        tests.into_iter().filter(|t| t.metadata.enabled).collect()
    }

    /// Create the corpus directory structure
    pub fn init_corpus(&self) -> Result<()> {
        let dirs = ["basic", "time", "scope", "edge-cases", "regression"];

        for dir in &dirs {
            fs::create_dir_all(self.corpus_dir.join(dir))?;
        }

        self.create_sample_test()
    }

    /// Write the sample levelops case unless one is already there
    fn create_sample_test(&self) -> Result<()> {
        let test_dir = self.corpus_dir.join("basic/levelops-workitem-state");
        let test_path = test_dir.join("test.json");
        if test_path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&test_dir)?;

        let test_case = TestCase {
            name: "levelops-workitem-state".to_string(),
            category: "basic".to_string(),
            input: TestInput {
                request: serde_json::json!({
                    "context": {
                        "application": "levelops",
                        "x_axis": {"name": "NEW", "id": "27"},
                        "across": "state"
                    },
                    "widget": {
                        "type": "levelops_workitem_count_report",
                        "query": {"across": "state"}
                    }
                }),
                registry: None,
            },
            expectations: TestExpectations::default(),
            metadata: TestMetadata {
                description: "Clicking a work item state bar filters on that status".to_string(),
                tags: vec!["levelops".to_string(), "smoke".to_string()],
                enabled: true,
                priority: 1,
            },
        };

        let content = serde_json::to_string_pretty(&test_case)?;
        fs::write(test_path, content)?;

        Ok(())
    }

    /// List all test categories
    pub fn list_categories(&self) -> Result<Vec<String>> {
        let mut categories = Vec::new();

        if !self.corpus_dir.exists() {
            return Ok(categories);
        }

        for entry in fs::read_dir(&self.corpus_dir)? {
            let path = entry?.path();

            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    if name != "snapshots" {
                        categories.push(name.to_string());
                    }
                }
            }
        }

        categories.sort();
        Ok(categories)
    }

    pub fn get_statistics(&self) -> Result<CorpusStatistics> {
        let tests = self.discover_tests()?;

        let mut stats = CorpusStatistics {
            total_tests: tests.len(),
            ..Default::default()
        };

        for test in tests {
            if test.metadata.enabled {
                stats.enabled_tests += 1;
            } else {
                stats.disabled_tests += 1;
            }

            if let Some(report) = test.input.request.pointer("/widget/type").and_then(Value::as_str) {
                *stats.tests_by_report.entry(report.to_string()).or_insert(0) += 1;
            }

            *stats.tests_by_category.entry(test.category).or_insert(0) += 1;

            for tag in test.metadata.tags {
                *stats.tests_by_tag.entry(tag).or_insert(0) += 1;
            }
        }

        Ok(stats)
    }
}

/// Read the `.json` file named by a string input
fn resolve_reference(dir: &Path, value: &Value) -> Result<Option<Value>> {
    let Value::String(filename) = value else {
        return Ok(None);
    };
    if !filename.ends_with(".json") {
        return Err(GoldenError::CorpusError(format!(
            "Unsupported input reference '{}'",
            filename
        )));
    }
    let content = fs::read_to_string(dir.join(filename))?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Statistics about the test corpus
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    pub total_tests: usize,
    pub enabled_tests: usize,
    pub disabled_tests: usize,
    pub tests_by_category: HashMap<String, usize>,
    pub tests_by_tag: HashMap<String, usize>,
    pub tests_by_report: HashMap<String, usize>,
}

fn print_counts(title: &str, counts: &HashMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    println!("\n{}:", title);
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by_key(|(k, _)| k.as_str());
    for (key, count) in entries {
        println!("  {}: {}", key, count);
    }
}

impl CorpusStatistics {
    /// Print statistics to stdout
    pub fn print(&self) {
        println!("=== Corpus Statistics ===");
        println!("Total tests: {}", self.total_tests);
        println!("Enabled: {}", self.enabled_tests);
        println!("Disabled: {}", self.disabled_tests);

        print_counts("Tests by category", &self.tests_by_category);
        print_counts("Tests by report", &self.tests_by_report);
        print_counts("Tests by tag", &self.tests_by_tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn case(name: &str, category: &str, tags: &[&str]) -> TestCase {
        TestCase {
            name: name.to_string(),
            category: category.to_string(),
            input: TestInput {
                request: serde_json::json!({"widget": {"type": "tickets_report"}}),
                registry: None,
            },
            expectations: TestExpectations::default(),
            metadata: TestMetadata {
                description: String::new(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                enabled: true,
                priority: 100,
            },
        }
    }

    #[test]
    fn test_corpus_manager_init() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());

        manager.init_corpus().unwrap();

        assert!(temp_dir.path().join("basic").exists());
        assert!(temp_dir.path().join("time").exists());
        assert!(temp_dir
            .path()
            .join("basic/levelops-workitem-state/test.json")
            .exists());
    }

    #[test]
    fn test_discover_tests() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());

        manager.init_corpus().unwrap();

        let tests = manager.discover_tests().unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id(), "basic/levelops-workitem-state");
    }

    #[test]
    fn test_request_file_reference() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("time/weekly");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("request.json"),
            r#"{"widget": {"type": "tickets_report", "query": {"across": "issue_created"}}}"#,
        )
        .unwrap();
        fs::write(
            dir.join("test.json"),
            r#"{
                "name": "weekly",
                "category": "time",
                "input": {"request": "request.json"},
                "metadata": {"description": "weekly bucket"}
            }"#,
        )
        .unwrap();

        let manager = CorpusManager::new(temp_dir.path());
        let test = manager.load_test_case(&dir.join("test.json")).unwrap();
        assert_eq!(test.input.request["widget"]["type"], "tickets_report");
        assert_eq!(test.expectations.match_mode, MatchMode::Exact);
        assert!(test.expectations.should_succeed);
    }

    #[test]
    fn test_filter_by_category_and_tags() {
        let manager = CorpusManager::new("/nonexistent");
        let tests = vec![
            case("a", "basic", &["smoke"]),
            case("b", "time", &["weeks"]),
            case("c", "time", &["smoke"]),
        ];

        let time = manager.filter_by_category(tests.clone(), "time");
        assert_eq!(time.len(), 2);

        let smoke = manager.filter_by_tags(tests.clone(), &["smoke".to_string()]);
        let names: Vec<_> = smoke.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);

        let mut disabled = tests;
        disabled[1].metadata.enabled = false;
        assert_eq!(manager.filter_enabled(disabled).len(), 2);
    }

    #[test]
    fn test_statistics_count_reports() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());
        manager.init_corpus().unwrap();

        let stats = manager.get_statistics().unwrap();
        assert_eq!(stats.total_tests, 1);
        assert_eq!(stats.tests_by_report["levelops_workitem_count_report"], 1);
        assert_eq!(manager.list_categories().unwrap().len(), 5);
    }
}
