//! Bit-packed logging header generation.
//!
//! This crate turns a `loggen.toml` description of label groups into a
//! self-contained C header:
//! - one enum constant per label, bit-packed along orthogonal axes
//! - one bitmask per group plus a catch-all `EVERYTHING` mask
//! - a variadic `Log(Flags, Format, ...)` macro gated on a verbosity
//!   threshold
//! - one switch-based label-lookup function per group
//!
//! # Usage in build.rs
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     println!("cargo:rerun-if-changed=loggen.toml");
//!     loggen::generate("loggen.toml", "include/logger.h")
//!         .expect("Failed to generate logging header");
//! }
//! ```
//!
//! # Allocation Modes
//!
//! `mode = "flags"` spends one bit per label, so flag words can carry any
//! union of labels and the macro guard is a plain bit intersection.
//! `mode = "grouped"` packs each group as a dense integer sub-range; the
//! first group then acts as a minimum-severity threshold.
//!
//! # Lock File Mechanism
//!
//! Generated values are ABI for every consumer that stores or compares flag
//! words, so changes to `loggen.toml` must be intentional:
//!
//! - First run: generates `loggen.lock.toml` with every label's value
//! - Subsequent runs: compares the fresh layout against the lock
//! - Labels removed or re-numbered: **error** (default) or **warning**
//!   (with `on_change = "warn"`)
//! - New labels at the end of the last group: automatically accepted
//!
//! To intentionally break compatibility, delete the lock file and rerun.

mod codegen;
mod layout;
mod lock;
mod toml_parser;

pub use codegen::generate_header;
pub use layout::{
    GenerationMode, GroupLayout, GroupSpec, Layout, LayoutError, EVERYTHING, MAX_BITS,
};
pub use lock::{LayoutDiff, LockEntry, LockFile, LockFileError};
pub use toml_parser::{ConfigError, LoggenConfig, OnChange};

use std::path::Path;

/// Main entry point for build.rs integration.
///
/// Reads `loggen.toml`, compares the computed layout with
/// `loggen.lock.toml`, and writes the generated header.
///
/// # Arguments
///
/// * `config_path` - Path to `loggen.toml`
/// * `output_path` - Path to the output header (e.g., `include/logger.h`)
///
/// # Errors
///
/// Returns an error if:
/// - `loggen.toml` cannot be read, parsed, or validated
/// - The layout does not fit the 31 usable bits
/// - Layout drift is detected against the lock and `on_change = "error"`
/// - The lock or output file cannot be written
pub fn generate(
    config_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<(), GenerateError> {
    let config_path = config_path.as_ref();
    let output_path = output_path.as_ref();

    // Derive lock file path from config path
    let lock_path = config_path.with_extension("lock.toml");

    generate_with_lock(config_path, &lock_path, output_path)
}

/// Generate with an explicit lock file path.
pub fn generate_with_lock(
    config_path: impl AsRef<Path>,
    lock_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<(), GenerateError> {
    let config_path = config_path.as_ref();
    let lock_path = lock_path.as_ref();
    let output_path = output_path.as_ref();

    // 1. Parse and validate loggen.toml
    let config = LoggenConfig::from_file(config_path)?;

    // 2. Compute the immutable layout; nothing is emitted past a failure here
    let layout = Layout::compute(config.mode, &config.groups)?;

    // 3. Diff against the previous run, if any
    if lock_path.exists() {
        let existing = LockFile::from_file(lock_path)?;
        let diff = existing.diff(&layout);
        if diff.is_breaking() {
            match config.on_change {
                OnChange::Error => {
                    return Err(GenerateError::LayoutDrift(format_drift_error(&diff)));
                }
                OnChange::Warn => {
                    for path in &diff.removed {
                        eprintln!(
                            "loggen: warning: '{}' was removed; its bits will be reassigned",
                            path
                        );
                    }
                    for (path, old, new) in &diff.moved {
                        eprintln!(
                            "loggen: warning: '{}' moved from 0x{:08x} to 0x{:08x}",
                            path, old, new
                        );
                    }
                }
            }
        }
    }

    // 4. Pin the accepted layout
    LockFile::from_layout(&config, &layout).write_to_file(lock_path)?;

    // 5. Emit the header in one piece
    let code = codegen::generate_header(&config, &layout);
    std::fs::write(output_path, code)?;

    Ok(())
}

/// Pure generation path: no files touched, no lock consulted.
///
/// Useful for previews, stdout pipelines, and callers that build the
/// [`LoggenConfig`] in memory instead of from TOML.
pub fn render_header(config: &LoggenConfig) -> Result<String, GenerateError> {
    let layout = Layout::compute(config.mode, &config.groups)?;
    Ok(codegen::generate_header(config, &layout))
}

fn format_drift_error(diff: &LayoutDiff) -> String {
    let mut msg = String::new();
    msg.push_str("loggen: Layout drift detected!\n\n");
    if !diff.removed.is_empty() {
        msg.push_str("  Removed since the last generation:\n");
        for path in &diff.removed {
            msg.push_str(&format!("    - {}\n", path));
        }
    }
    if !diff.moved.is_empty() {
        msg.push_str("  Values changed (consumers would see different bits):\n");
        for (path, old, new) in &diff.moved {
            msg.push_str(&format!("    - {}: 0x{:08x} -> 0x{:08x}\n", path, old, new));
        }
    }
    msg.push_str("\n  To fix:\n");
    msg.push_str("    1. Restore the removed or reordered labels in loggen.toml, OR\n");
    msg.push_str("    2. Set `on_change = \"warn\"` in loggen.toml to accept the re-numbering, OR\n");
    msg.push_str("    3. Delete the lock file to regenerate (BREAKING CHANGE!)\n");
    msg
}

/// Errors that can occur during generation.
#[derive(Debug)]
pub enum GenerateError {
    /// Failed to parse or validate loggen.toml
    ConfigError(ConfigError),
    /// Group validation or bit-capacity failure
    LayoutError(LayoutError),
    /// Failed to read/write the lock file
    LockError(LockFileError),
    /// Lock file mismatch (labels removed or re-numbered)
    LayoutDrift(String),
    /// IO error
    Io(std::io::Error),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(e) => write!(f, "Config error: {}", e),
            Self::LayoutError(e) => write!(f, "Layout error: {}", e),
            Self::LockError(e) => write!(f, "Lock file error: {}", e),
            Self::LayoutDrift(msg) => write!(f, "{}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<ConfigError> for GenerateError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigError(e)
    }
}

impl From<LayoutError> for GenerateError {
    fn from(e: LayoutError) -> Self {
        Self::LayoutError(e)
    }
}

impl From<LockFileError> for GenerateError {
    fn from(e: LockFileError) -> Self {
        Self::LockError(e)
    }
}

impl From<std::io::Error> for GenerateError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
