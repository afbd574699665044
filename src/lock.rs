//! Lock file management — pins generated constant values across runs.
//!
//! Emitted constants are ABI for every consumer that has ever stored or
//! logged a flags word: removing a label silently renumbers everything
//! allocated after it. The lock file (`loggen.lock.toml` next to the
//! config) records each label's assigned value so that an accidental
//! removal or reorder is caught at generation time instead of in the field.
//!
//! - First run: the lock file is created from the computed layout.
//! - Later runs: the new layout is diffed against the lock. Added labels
//!   are always fine; removed labels and moved values are layout drift and
//!   fail the run unless the config opts into `on_change = "warn"`.
//! - Deleting the lock file accepts a breaking re-numbering on purpose.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::layout::Layout;
use crate::toml_parser::LoggenConfig;

/// One locked label: `path` is `Group.Label`, `value` the emitted constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub path: String,
    pub value: u32,
}

/// On-disk lock document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    pub generated_at: String,
    pub mode: String,
    pub prefix: String,
    #[serde(default, rename = "entry")]
    pub entries: Vec<LockEntry>,
}

/// Difference between a lock file and a freshly computed layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDiff {
    /// Paths present in the layout but not in the lock.
    pub added: Vec<String>,
    /// Paths present in the lock but gone from the layout.
    pub removed: Vec<String>,
    /// Paths whose value changed: (path, locked value, new value).
    pub moved: Vec<(String, u32, u32)>,
}

impl LayoutDiff {
    /// True when regeneration would change the meaning of existing flags.
    pub fn is_breaking(&self) -> bool {
        !self.removed.is_empty() || !self.moved.is_empty()
    }
}

impl LockFile {
    /// Snapshot a computed layout into lock form.
    pub fn from_layout(config: &LoggenConfig, layout: &Layout) -> Self {
        let entries = layout
            .groups
            .iter()
            .flat_map(|group| {
                group.labels.iter().zip(&group.values).map(|(label, value)| LockEntry {
                    path: format!("{}.{}", group.name, label),
                    value: *value,
                })
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            mode: layout.mode.as_str().to_string(),
            prefix: config.prefix.clone(),
            entries,
        }
    }

    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LockFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LockFileError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, LockFileError> {
        toml::from_str(content).map_err(|e| LockFileError::Parse(e.to_string()))
    }

    /// Serialize and write, with a do-not-edit banner.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockFileError> {
        let body = toml::to_string_pretty(self)
            .map_err(|e| LockFileError::Serialize(e.to_string()))?;
        let content = format!(
            "# Generated by loggen. Records the assigned value of every label.\n\
             # Delete this file to accept a breaking re-numbering of the layout.\n\n{}",
            body
        );
        std::fs::write(path.as_ref(), content).map_err(|e| {
            LockFileError::Io(format!(
                "Failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Look up a locked entry by `Group.Label` path.
    pub fn get(&self, path: &str) -> Option<&LockEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Compare against a freshly computed layout.
    ///
    /// `removed` and `moved` follow lock order, `added` follows layout
    /// order, so the report is stable across runs.
    pub fn diff(&self, layout: &Layout) -> LayoutDiff {
        let mut current: Vec<(String, u32)> = Vec::new();
        for group in &layout.groups {
            for (label, value) in group.labels.iter().zip(&group.values) {
                current.push((format!("{}.{}", group.name, label), *value));
            }
        }
        let current_by_path: HashMap<&str, u32> =
            current.iter().map(|(p, v)| (p.as_str(), *v)).collect();
        let locked_paths: HashMap<&str, u32> =
            self.entries.iter().map(|e| (e.path.as_str(), e.value)).collect();

        let mut diff = LayoutDiff::default();
        for entry in &self.entries {
            match current_by_path.get(entry.path.as_str()) {
                None => diff.removed.push(entry.path.clone()),
                Some(&value) if value != entry.value => {
                    diff.moved.push((entry.path.clone(), entry.value, value));
                }
                Some(_) => {}
            }
        }
        for (path, _) in &current {
            if !locked_paths.contains_key(path.as_str()) {
                diff.added.push(path.clone());
            }
        }
        diff
    }
}

/// Errors while reading or writing the lock file.
#[derive(Debug)]
pub enum LockFileError {
    /// IO error
    Io(String),
    /// TOML parse error
    Parse(String),
    /// TOML serialization error
    Serialize(String),
}

impl std::fmt::Display for LockFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {}", msg),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
            Self::Serialize(msg) => write!(f, "Serialize error: {}", msg),
        }
    }
}

impl std::error::Error for LockFileError {}
