//! Structural diffing of compiled filter documents

use crate::{GoldenError, Result};
use colored::*;
use regex::Regex;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;

/// Options for diff comparison
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Whether to use colored output
    pub colored: bool,

    /// Unchanged lines kept around each change
    pub context_lines: usize,

    /// Sort keys and trim strings before comparison
    pub normalize: bool,

    /// Append the complete line diff after the grouped one
    pub full_diff: bool,

    /// Maximum diff lines to show (0 = unlimited)
    pub max_diff_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            colored: true,
            context_lines: 3,
            normalize: true,
            full_diff: false,
            max_diff_lines: 100,
        }
    }
}

/// Result of a diff operation
#[derive(Debug)]
pub struct DiffResult {
    pub matches: bool,

    /// Human-readable diff output
    pub diff_output: String,

    pub summary: DiffSummary,
}

/// Summary of diff changes
#[derive(Debug, Default)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    /// Paths that differ, e.g. `filters.filter.issue_created_at.$gt`
    pub differing_paths: Vec<String>,
}

/// Engine for comparing JSON values
pub struct DiffEngine {
    options: DiffOptions,
    volatile_patterns: Vec<(String, Regex)>,
}

const MASK: &str = "***MASKED***";

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            options,
            volatile_patterns: Vec::new(),
        }
    }

    /// Mask the string at `path` whenever it matches `pattern`
    pub fn add_volatile_pattern(&mut self, path: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)
            .map_err(|e| GoldenError::CorpusError(format!("Invalid regex pattern: {}", e)))?;

        self.volatile_patterns.push((path.to_string(), regex));
        Ok(())
    }

    /// Compare two JSON values
    pub fn compare(&self, expected: &Value, actual: &Value) -> DiffResult {
        let (expected, actual) = if self.options.normalize {
            (
                crate::snapshot::normalize_json(expected),
                crate::snapshot::normalize_json(actual),
            )
        } else {
            (expected.clone(), actual.clone())
        };

        let expected = self.mask_volatile_fields(&expected);
        let actual = self.mask_volatile_fields(&actual);

        if expected == actual {
            return DiffResult {
                matches: true,
                diff_output: String::new(),
                summary: DiffSummary::default(),
            };
        }

        DiffResult {
            matches: false,
            diff_output: self.generate_diff_output(&expected, &actual),
            summary: self.collect_diff_summary(&expected, &actual),
        }
    }

    fn generate_diff_output(&self, expected: &Value, actual: &Value) -> String {
        let expected_str = pretty(expected);
        let actual_str = pretty(actual);

        let text_diff = TextDiff::from_lines(&expected_str, &actual_str);
        let mut output = String::new();

        let header = "=== Diff Output (- snapshot, + compiled) ===\n";
        if self.options.colored {
            output.push_str(&header.bold().to_string());
        } else {
            output.push_str(header);
        }

        let mut line_count = 0;

        for (i, group) in text_diff.grouped_ops(self.options.context_lines).into_iter().enumerate() {
            if i > 0 {
                output.push_str("...\n");
            }
            for op in group {
                for change in text_diff.iter_changes(&op) {
                    if self.options.max_diff_lines > 0 && line_count >= self.options.max_diff_lines {
                        output.push_str("... (diff truncated) ...\n");
                        return output;
                    }

                    let line = match change.tag() {
                        ChangeTag::Delete if self.options.colored => {
                            format!("{}{}", "-".red(), change.to_string().red())
                        }
                        ChangeTag::Delete => format!("-{}", change),
                        ChangeTag::Insert if self.options.colored => {
                            format!("{}{}", "+".green(), change.to_string().green())
                        }
                        ChangeTag::Insert => format!("+{}", change),
                        ChangeTag::Equal => format!(" {}", change),
                    };

                    output.push_str(&line);
                    line_count += 1;
                }
            }
        }

        if self.options.full_diff {
            output.push_str(&self.simple_diff(&expected_str, &actual_str));
        }

        output
    }

    fn collect_diff_summary(&self, expected: &Value, actual: &Value) -> DiffSummary {
        let mut summary = DiffSummary::default();

        collect_diff_paths(expected, actual, String::new(), &mut summary.differing_paths);

        let expected_str = pretty(expected);
        let actual_str = pretty(actual);
        let text_diff = TextDiff::from_lines(&expected_str, &actual_str);

        for change in text_diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => summary.removed += 1,
                ChangeTag::Insert => summary.added += 1,
                ChangeTag::Equal => {}
            }
        }

        summary
    }

    fn mask_volatile_fields(&self, value: &Value) -> Value {
        let mut masked = value.clone();

        for (path, pattern) in &self.volatile_patterns {
            let parts: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
            mask_field_recursive(&mut masked, &parts, pattern);
        }

        masked
    }

    /// Plain line diff without color or truncation
    pub fn simple_diff(&self, expected: &str, actual: &str) -> String {
        let diff = TextDiff::from_lines(expected, actual);
        let mut output = String::new();

        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            output.push_str(&format!("{}{}", sign, change));
        }

        output
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn collect_diff_paths(expected: &Value, actual: &Value, path: String, paths: &mut Vec<String>) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            let keys: BTreeSet<_> = exp.keys().chain(act.keys()).collect();

            for key in keys {
                let new_path = join_path(&path, key);
                match (exp.get(key), act.get(key)) {
                    (Some(e), Some(a)) if e != a => collect_diff_paths(e, a, new_path, paths),
                    (Some(_), None) => paths.push(format!("{} (missing in compiled)", new_path)),
                    (None, Some(_)) => paths.push(format!("{} (extra in compiled)", new_path)),
                    _ => {}
                }
            }
        }
        (Value::Array(exp), Value::Array(act)) => {
            for (i, (e, a)) in exp.iter().zip(act.iter()).enumerate() {
                if e != a {
                    collect_diff_paths(e, a, format!("{}[{}]", path, i), paths);
                }
            }

            if exp.len() != act.len() {
                paths.push(format!(
                    "{} (array length mismatch: {} vs {})",
                    path,
                    exp.len(),
                    act.len()
                ));
            }
        }
        _ => {
            if expected != actual {
                paths.push(path);
            }
        }
    }
}

fn mask_field_recursive(value: &mut Value, path_parts: &[&str], pattern: &Regex) {
    let Some((first, rest)) = path_parts.split_first() else {
        return;
    };

    match value {
        Value::Object(map) => {
            let Some(field) = map.get_mut(*first) else {
                return;
            };
            if !rest.is_empty() {
                mask_field_recursive(field, rest, pattern);
                return;
            }
            let matched = match field {
                Value::String(s) => pattern.is_match(s),
                Value::Number(n) => pattern.is_match(&n.to_string()),
                _ => false,
            };
            if matched {
                *field = Value::String(MASK.to_string());
            }
        }
        Value::Array(arr) => {
            for item in arr {
                mask_field_recursive(item, path_parts, pattern);
            }
        }
        _ => {}
    }
}
