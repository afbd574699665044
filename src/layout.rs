//! Bit layout allocation — packs label groups into a 31-bit flags word.
//!
//! Each group owns one contiguous bit range; ranges are assigned in group
//! order starting at bit 0. Bit 31 is the sign bit of the generated `int`
//! constants and stays reserved.
//!
//! ## Example (flags mode, three groups)
//!
//! ```text
//! ┌──────────┬───────────────┬────────────┬────────────┐
//! │ reserved │ Subcategories │ Subsystems │ Priorities │
//! │ 19 bits  │ 4 bits        │ 4 bits     │ 5 bits     │
//! │ [31:13]  │ [12:9]        │ [8:5]      │ [4:0]      │
//! └──────────┴───────────────┴────────────┴────────────┘
//! ```
//!
//! Two allocation strategies exist: `BitFlags` spends one bit per label and
//! supports membership tests on arbitrary label unions, while `BitGroups`
//! packs each group as a dense integer sub-range and trades union tests for
//! a much smaller footprint.

use std::fmt;

/// Number of usable bits. Bit 31 is reserved so that every generated
/// constant fits a signed 32-bit `int`.
pub const MAX_BITS: u32 = 31;

/// Catch-all mask covering every usable bit.
pub const EVERYTHING: u32 = 0x7fff_ffff;

/// Strategy used to map labels to bit positions/values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// One bit per label; a group's range is as wide as its label count.
    #[default]
    BitFlags,
    /// Labels packed as a dense integer range within the group's bits.
    BitGroups,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BitFlags => "flags",
            Self::BitGroups => "grouped",
        }
    }
}

/// Caller-supplied description of one labeled category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    /// Order is significant: it fixes both value assignment and emission order.
    pub labels: Vec<String>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            name: name.into(),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
        }
    }
}

/// A group after layout: bit range, per-label values, and alignment width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    pub name: String,
    pub labels: Vec<String>,
    /// Inclusive start of this group's bit range.
    pub min_bit: u8,
    /// Exclusive end, one past the highest bit used.
    pub max_bit: u8,
    /// Length of the longest label, for column alignment in emitted text.
    pub max_label_len: usize,
    /// Encoded constant for each label, parallel to `labels`.
    pub values: Vec<u32>,
}

impl GroupLayout {
    /// Bitmask isolating exactly this group's bit range.
    pub fn mask(&self) -> u32 {
        ((1u32 << self.max_bit) - 1) & !((1u32 << self.min_bit) - 1)
    }
}

/// The finalized layout for one generation run. Computed once by
/// [`Layout::compute`] and read-only afterwards; the emitters never see a
/// half-laid-out state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub mode: GenerationMode,
    pub groups: Vec<GroupLayout>,
}

impl Layout {
    /// Assign bit ranges and label values for every group, in order.
    ///
    /// Group `i` starts where group `i - 1` ended; the first group starts at
    /// bit 0. Fails if a group is unnamed or empty, or if the packing would
    /// spill past bit 30.
    pub fn compute(mode: GenerationMode, groups: &[GroupSpec]) -> Result<Self, LayoutError> {
        if groups.is_empty() {
            return Err(LayoutError::Validation {
                group: 0,
                reason: "no groups supplied".into(),
            });
        }

        let mut laid_out = Vec::with_capacity(groups.len());
        let mut next_bit: u8 = 0;

        for (index, spec) in groups.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(LayoutError::Validation {
                    group: index,
                    reason: "group has no name".into(),
                });
            }
            if spec.labels.is_empty() {
                return Err(LayoutError::Validation {
                    group: index,
                    reason: "group has no labels".into(),
                });
            }

            let count = spec.labels.len() as u32;
            let min_bit = next_bit;

            let max_bit = match mode {
                GenerationMode::BitFlags => {
                    let needed = u32::from(min_bit) + count;
                    if needed > MAX_BITS {
                        return Err(LayoutError::Capacity { needed });
                    }
                    needed as u8
                }
                GenerationMode::BitGroups => {
                    // Width covers the group's maximum raw value, count << min_bit.
                    let raw = u64::from(count) << min_bit;
                    let needed = floor_log2(raw) + 1;
                    if needed > MAX_BITS {
                        return Err(LayoutError::Capacity { needed });
                    }
                    needed as u8
                }
            };

            // In grouped mode, label 0 of the first group encodes as 0 so the
            // group doubles as a plain severity threshold. Later groups skip
            // encoding 0 within their sub-range: it means "no selection".
            let base = if index == 0 { 0u32 } else { 1u32 };
            let values: Vec<u32> = match mode {
                GenerationMode::BitFlags => (0..count)
                    .map(|k| 1u32 << (u32::from(min_bit) + k))
                    .collect(),
                GenerationMode::BitGroups => (0..count).map(|k| (k + base) << min_bit).collect(),
            };

            let max_label_len = spec.labels.iter().map(String::len).max().unwrap_or(0);

            laid_out.push(GroupLayout {
                name: spec.name.clone(),
                labels: spec.labels.clone(),
                min_bit,
                max_bit,
                max_label_len,
                values,
            });
            next_bit = max_bit;
        }

        Ok(Self {
            mode,
            groups: laid_out,
        })
    }

    /// Length of the longest label across all groups.
    pub fn longest_label(&self) -> usize {
        self.groups.iter().map(|g| g.max_label_len).max().unwrap_or(0)
    }

    /// Length of the longest group name.
    pub fn longest_group_name(&self) -> usize {
        self.groups.iter().map(|g| g.name.len()).max().unwrap_or(0)
    }

    /// One past the highest bit used by any group.
    pub fn total_bits(&self) -> u8 {
        self.groups.last().map_or(0, |g| g.max_bit)
    }
}

/// Floor of log2, with 0 mapping to 0 (the shift-count definition the
/// layout width formula is specified against).
fn floor_log2(value: u64) -> u32 {
    if value == 0 {
        0
    } else {
        u64::BITS - 1 - value.leading_zeros()
    }
}

/// Errors detected while validating groups or assigning bit ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A group is structurally unusable (no name, no labels).
    Validation { group: usize, reason: String },
    /// The packing does not fit the 31 usable bits.
    Capacity { needed: u32 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { group, reason } => {
                write!(f, "group {}: {}", group, reason)
            }
            Self::Capacity { needed } => write!(
                f,
                "layout needs {} bits but only {} are available (bit 31 is reserved); \
                 \"grouped\" mode packs labels more densely than \"flags\"",
                needed, MAX_BITS
            ),
        }
    }
}

impl std::error::Error for LayoutError {}
