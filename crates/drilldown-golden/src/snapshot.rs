//! Snapshot storage for golden tests
//!
//! A snapshot is the compiled output of one corpus case, stored as
//! `<snapshot_dir>/<category>/<name>.json` together with some bookkeeping.

use crate::{GoldenError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A stored compiled output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,

    pub metadata: SnapshotMetadata,

    /// The compiled drill-down, `{}` for non-drillable reports
    pub content: Value,

    /// Fields to ignore during comparison
    #[serde(default)]
    pub ignore_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Version of the snapshot format
    pub version: String,

    pub created_at: String,

    pub updated_at: String,

    pub description: Option<String>,

    /// Crate version that wrote the snapshot
    #[serde(default)]
    pub compiler_version: Option<String>,
}

/// Manages reading and writing snapshots
pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new(snapshot_dir: impl AsRef<Path>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.as_ref().to_path_buf(),
        }
    }

    /// Load a snapshot from disk
    pub fn load(&self, name: &str) -> Result<Snapshot> {
        let path = self.snapshot_path(name);

        if !path.exists() {
            return Err(GoldenError::CorpusError(format!(
                "Snapshot '{}' not found at {:?}",
                name, path
            )));
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save a snapshot to disk
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.snapshot_path(&snapshot.name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut content = serde_json::to_string_pretty(snapshot)?;
        content.push('\n');
        fs::write(&path, content)?;

        Ok(())
    }

    /// Replace the content of an existing snapshot
    pub fn update(&self, name: &str, new_content: Value) -> Result<()> {
        let mut snapshot = self.load(name)?;

        snapshot.content = new_content;
        snapshot.metadata.updated_at = Utc::now().to_rfc3339();
        snapshot.metadata.compiler_version = Some(drilldown_core::VERSION.to_string());

        self.save(&snapshot)
    }

    pub fn create(&self, name: &str, content: Value, description: Option<String>) -> Result<Snapshot> {
        let now = Utc::now().to_rfc3339();

        let snapshot = Snapshot {
            name: name.to_string(),
            metadata: SnapshotMetadata {
                version: "1.0.0".to_string(),
                created_at: now.clone(),
                updated_at: now,
                description,
                compiler_version: Some(drilldown_core::VERSION.to_string()),
            },
            content,
            ignore_fields: Vec::new(),
        };

        self.save(&snapshot)?;
        Ok(snapshot)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.snapshot_path(name).exists()
    }

    /// List snapshot names relative to the snapshot directory
    pub fn list(&self) -> Result<Vec<String>> {
        let mut snapshots = Vec::new();

        if !self.snapshot_dir.exists() {
            return Ok(snapshots);
        }

        for entry in walkdir::WalkDir::new(&self.snapshot_dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.snapshot_dir) {
                let name = relative.with_extension("").to_string_lossy().replace('\\', "/");
                if !name.contains(".backup.") {
                    snapshots.push(name);
                }
            }
        }

        snapshots.sort();
        Ok(snapshots)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.snapshot_path(name);

        if path.exists() {
            fs::remove_file(path)?;
        }

        Ok(())
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        let filename = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{}.json", name)
        };

        self.snapshot_dir.join(filename)
    }

    /// Copy a snapshot aside before it is overwritten
    pub fn backup(&self, name: &str) -> Result<()> {
        let source = self.snapshot_path(name);

        if !source.exists() {
            return Ok(());
        }

        let backup_name = format!("{}.backup.{}", name, Utc::now().timestamp());
        fs::copy(source, self.snapshot_path(&backup_name))?;
        Ok(())
    }
}

/// Sort object keys and trim strings
pub fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(k, _)| k.as_str());

            let normalized: Map<String, Value> = entries
                .into_iter()
                .map(|(key, val)| (key.clone(), normalize_json(val)))
                .collect();
            Value::Object(normalized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(normalize_json).collect()),
        Value::String(s) => Value::String(s.trim().to_string()),
        _ => value.clone(),
    }
}

/// Keep only the parts of `actual` whose keys appear in `expected`
///
/// Arrays are compared whole; a subset snapshot cannot pick array elements.
pub fn project_onto(actual: &Value, expected: &Value) -> Value {
    match (actual, expected) {
        (Value::Object(act), Value::Object(exp)) => {
            let projected: Map<String, Value> = exp
                .iter()
                .filter_map(|(key, exp_val)| {
                    act.get(key)
                        .map(|act_val| (key.clone(), project_onto(act_val, exp_val)))
                })
                .collect();
            Value::Object(projected)
        }
        _ => actual.clone(),
    }
}

/// Remove every dotted path in `ignore_fields` from `value`
pub fn apply_ignores(value: &mut Value, ignore_fields: &[String]) {
    for field_path in ignore_fields {
        let parts: Vec<&str> = field_path.split('.').filter(|s| !s.is_empty()).collect();
        remove_field_recursive(value, &parts);
    }
}

fn remove_field_recursive(value: &mut Value, path_parts: &[&str]) {
    let Some((first, rest)) = path_parts.split_first() else {
        return;
    };

    match value {
        Value::Object(map) => {
            if rest.is_empty() {
                map.remove(*first);
            } else if let Some(next_value) = map.get_mut(*first) {
                remove_field_recursive(next_value, rest);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                remove_field_recursive(item, path_parts);
            }
        }
        _ => {}
    }
}
