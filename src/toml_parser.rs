//! TOML configuration parser for loggen.toml.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::layout::{GenerationMode, GroupSpec};

/// Behavior when regeneration would drop a locked label or move its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnChange {
    /// Fail the run (default, safest — emitted values are consumer ABI)
    #[default]
    Error,
    /// Print a warning, accept the new layout, rewrite the lock
    Warn,
}

/// Parsed and validated generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggenConfig {
    /// Prefix glued onto every emitted identifier (may be empty)
    pub prefix: String,
    /// Allocation strategy for the whole run
    pub mode: GenerationMode,
    /// Behavior when the lock file detects layout drift
    pub on_change: OnChange,
    /// Name of the extern verbosity threshold the emitted macro reads
    pub verbosity_symbol: String,
    /// Name of the emitted logging macro
    pub macro_name: String,
    /// Ordered label groups
    pub groups: Vec<GroupSpec>,
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
struct RawConfig {
    /// Optional identifier prefix (defaults to "")
    prefix: Option<String>,
    /// Allocation mode: "flags" (default) or "grouped"
    mode: Option<String>,
    /// Drift behavior: "error" (default) or "warn"
    on_change: Option<String>,
    /// Verbosity symbol read by the emitted macro (defaults to "GlobalVerbosity")
    verbosity_symbol: Option<String>,
    /// Name of the emitted macro (defaults to "Log")
    macro_name: Option<String>,
    /// Group definitions, in emission order
    #[serde(default, rename = "group")]
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    name: String,
    labels: Vec<String>,
}

impl LoggenConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let prefix = raw.prefix.unwrap_or_default();
        if !prefix.is_empty() && !is_identifier(&prefix) {
            return Err(ConfigError::Validation(format!(
                "Invalid prefix '{}': must be a C identifier fragment",
                prefix
            )));
        }

        let mode = match raw.mode.as_deref() {
            None | Some("flags") => GenerationMode::BitFlags,
            Some("grouped") => GenerationMode::BitGroups,
            Some(other) => {
                return Err(ConfigError::Validation(format!(
                    "Invalid mode value '{}': expected 'flags' or 'grouped'",
                    other
                )));
            }
        };

        let on_change = match raw.on_change.as_deref() {
            None | Some("error") => OnChange::Error,
            Some("warn") => OnChange::Warn,
            Some(other) => {
                return Err(ConfigError::Validation(format!(
                    "Invalid on_change value '{}': expected 'error' or 'warn'",
                    other
                )));
            }
        };

        let verbosity_symbol = raw
            .verbosity_symbol
            .unwrap_or_else(|| "GlobalVerbosity".to_string());
        if !is_identifier(&verbosity_symbol) {
            return Err(ConfigError::Validation(format!(
                "Invalid verbosity_symbol '{}': must be a C identifier",
                verbosity_symbol
            )));
        }

        let macro_name = raw.macro_name.unwrap_or_else(|| "Log".to_string());
        if !is_identifier(&macro_name) {
            return Err(ConfigError::Validation(format!(
                "Invalid macro_name '{}': must be a C identifier",
                macro_name
            )));
        }

        let groups = Self::validate_groups(&raw.groups)?;

        Ok(Self {
            prefix,
            mode,
            on_change,
            verbosity_symbol,
            macro_name,
            groups,
        })
    }

    /// Validate group/label names and map them into [`GroupSpec`]s.
    ///
    /// Every name must be a C identifier, group names must be unique even
    /// after the uppercasing applied to mask constants, and labels must be
    /// unique across the whole run (they all share the enum namespace and
    /// become local bindings in the emitted macro).
    fn validate_groups(raw: &[RawGroup]) -> Result<Vec<GroupSpec>, ConfigError> {
        if raw.is_empty() {
            return Err(ConfigError::Validation(
                "Config defines no [[group]] tables".into(),
            ));
        }

        let mut seen_groups: HashSet<String> = HashSet::new();
        let mut seen_labels: HashSet<String> = HashSet::new();
        let mut groups = Vec::with_capacity(raw.len());

        for (index, group) in raw.iter().enumerate() {
            if group.name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Group {}: name must not be empty",
                    index
                )));
            }
            if !is_identifier(&group.name) {
                return Err(ConfigError::Validation(format!(
                    "Group {}: name '{}' is not a valid C identifier",
                    index, group.name
                )));
            }
            // Mask constants are the uppercased group name, so names that
            // collide only by case still collide in the generated header.
            let upper = group.name.to_ascii_uppercase();
            if upper == "EVERYTHING" {
                return Err(ConfigError::Validation(format!(
                    "Group {}: name '{}' collides with the EVERYTHING mask",
                    index, group.name
                )));
            }
            if !seen_groups.insert(upper) {
                return Err(ConfigError::Validation(format!(
                    "Group {}: duplicate group name '{}'",
                    index, group.name
                )));
            }

            if group.labels.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Group {} ('{}'): no labels specified",
                    index, group.name
                )));
            }
            for label in &group.labels {
                if !is_identifier(label) {
                    return Err(ConfigError::Validation(format!(
                        "Group {} ('{}'): label '{}' is not a valid C identifier",
                        index, group.name, label
                    )));
                }
                if label == "EVERYTHING" {
                    return Err(ConfigError::Validation(format!(
                        "Group {} ('{}'): label 'EVERYTHING' collides with the catch-all mask",
                        index, group.name
                    )));
                }
                if !seen_labels.insert(label.clone()) {
                    return Err(ConfigError::Validation(format!(
                        "Group {} ('{}'): duplicate label '{}'",
                        index, group.name, label
                    )));
                }
            }

            groups.push(GroupSpec {
                name: group.name.clone(),
                labels: group.labels.clone(),
            });
        }

        Ok(groups)
    }
}

/// Check for a valid C identifier: starts with a letter or underscore,
/// continues with alphanumerics or underscores. ASCII only.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors during config parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// TOML parse error
    Parse(String),
    /// Validation error
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {}", msg),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
