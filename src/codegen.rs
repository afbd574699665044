//! C header emission from a finalized [`Layout`].
//!
//! Four sections, in fixed order: the bit-layout diagram (a block comment),
//! the enum with per-label constants and per-group masks, the variadic
//! logging macro, and one label-lookup function per group. All emitters are
//! pure text producers over the read-only layout; nothing here can fail.

use crate::layout::{GenerationMode, GroupLayout, Layout, EVERYTHING};
use crate::toml_parser::LoggenConfig;

/// Width of the truncated `__FILE__` field in the emitted printf format.
const FILENAME_WIDTH: usize = 12;

/// Render the complete header text.
pub fn generate_header(config: &LoggenConfig, layout: &Layout) -> String {
    let mut out = String::new();
    out.push_str(&render_diagram(layout));
    out.push('\n');
    out.push_str(&format!("extern int {};\n\n", config.verbosity_symbol));
    out.push_str(&render_enum(config, layout));
    out.push('\n');
    out.push_str(&render_log_macro(config, layout));
    out.push('\n');
    out.push_str(&render_label_functions(config, layout));
    out
}

/// ASCII box diagram of the final bit layout, wrapped in a C block comment.
///
/// Groups are annotated highest bit range first; the `|`/`v` marker columns
/// sit over the cell of each group's `max_bit` (the exclusive boundary).
fn render_diagram(layout: &Layout) -> String {
    // Marker rows are OFFSET characters wide; the box's bit-31 cell sits at
    // column 3 of the emitted line, bit 0 at column 34.
    const OFFSET: usize = 33;

    let mut out = String::from("/*\n");

    for (index, group) in layout.groups.iter().enumerate().rev() {
        let start = OFFSET + 1 - group.max_bit as usize;
        let mut row = vec![' '; start];
        row[start - 2] = '+';
        row[start - 1] = '-';
        for later in &layout.groups[index + 1..] {
            row[OFFSET - 1 - later.max_bit as usize] = '|';
        }
        let stub: String = row.into_iter().collect();
        let notice = if index == 0 && layout.mode == GenerationMode::BitGroups {
            " <-- Used for global verbosity"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {}{} (bits {}-{}){}\n",
            stub, group.name, group.min_bit, group.max_bit, notice
        ));
    }

    for marker in ['|', 'v'] {
        let mut row = vec![' '; OFFSET];
        for group in &layout.groups {
            row[OFFSET - group.max_bit as usize] = marker;
        }
        let line: String = row.into_iter().collect();
        out.push_str(&format!(" {}\n", line));
    }

    out.push_str("  +--------------------------------+\n");
    out.push_str("  |xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx|\n");
    out.push_str("  +--------------------------------+\n");
    out.push_str("   ^ bit 31                       ^ bit 0\n");
    out.push_str("*/\n");
    out
}

/// The enum block: one constant per label, then one mask per group, then
/// the catch-all `EVERYTHING` mask.
fn render_enum(config: &LoggenConfig, layout: &Layout) -> String {
    let prefix = &config.prefix;
    let label_pad = layout.longest_label() + prefix.len();
    let mask_pad = layout.longest_group_name().max("EVERYTHING".len()) + prefix.len();

    let mut out = String::from("enum\n{\n");

    for (index, group) in layout.groups.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("  // {}\n", group.name));
        for (k, label) in group.labels.iter().enumerate() {
            match layout.mode {
                GenerationMode::BitFlags => {
                    let shift = group.min_bit as usize + k;
                    out.push_str(&format!(
                        "  {}{:<label_pad$} = 1 << {:2},\n",
                        prefix, label, shift
                    ));
                }
                GenerationMode::BitGroups => {
                    out.push_str(&format!(
                        "  {}{:<label_pad$} = 0x{:08x},\n",
                        prefix, label, group.values[k]
                    ));
                }
            }
        }
    }

    out.push_str("\n  // Masks\n");
    for group in &layout.groups {
        out.push_str(&format!(
            "  {}{:<mask_pad$} = 0x{:08x},  /* (bits {:02}-{:02}) */\n",
            prefix,
            group.name.to_ascii_uppercase(),
            group.mask(),
            group.min_bit,
            group.max_bit - 1
        ));
    }
    out.push_str(&format!(
        "  {}{:<mask_pad$} = 0x{:08x}\n",
        prefix, "EVERYTHING", EVERYTHING
    ));
    out.push_str("};\n");
    out
}

/// The variadic logging macro.
///
/// Binds every bare label name to its prefixed constant so call sites can
/// write `Log(WARN|AUDIO, "...")`, guards against the verbosity threshold,
/// and prints one label lookup per group ahead of the caller's message.
fn render_log_macro(config: &LoggenConfig, layout: &Layout) -> String {
    let prefix = &config.prefix;
    let label_pad = layout.longest_label();

    let mut out = format!("#define {}(Flags, Format, ...) \\\n{{ \\\n", config.macro_name);

    for group in &layout.groups {
        for label in &group.labels {
            out.push_str(&format!(
                "  int {:<label_pad$} = {}{}; \\\n",
                label, prefix, label
            ));
        }
    }

    match layout.mode {
        GenerationMode::BitFlags => {
            out.push_str(&format!(
                "  if ((Flags) & {}) {{ \\\n",
                config.verbosity_symbol
            ));
        }
        GenerationMode::BitGroups => {
            // Threshold comparison over the first group's sub-range only;
            // both sides are masked to it.
            let first_mask = mask_ident(prefix, &layout.groups[0]);
            out.push_str(&format!(
                "  if (((Flags) & {m}) >= ({v} & {m})) {{ \\\n",
                m = first_mask,
                v = config.verbosity_symbol
            ));
        }
    }

    let group_fields = "%s".repeat(layout.groups.len());
    out.push_str(&format!(
        "    printf(\"{} %{w}.{w}s:%4i \" Format \"\\n\", \\\n",
        group_fields,
        w = FILENAME_WIDTH
    ));
    out.push_str("           ");
    for group in &layout.groups {
        out.push_str(&format!("{}{}Label(Flags), ", prefix, group.name));
    }
    out.push_str("\\\n           __FILE__, __LINE__, ##__VA_ARGS__); \\\n");
    out.push_str("  } \\\n");
    out.push_str("}\n");
    out
}

/// One pure lookup function per group, mapping a masked flags value back to
/// its bracketed, width-padded label. Unmatched values fall through to a
/// blank bracket of the same width.
fn render_label_functions(config: &LoggenConfig, layout: &Layout) -> String {
    let prefix = &config.prefix;
    let mut out = String::new();

    for group in &layout.groups {
        let width = group.max_label_len;
        out.push_str(&format!(
            "static inline const char* {}{}Label(int Flags)\n{{\n",
            prefix, group.name
        ));
        out.push_str(&format!(
            "  switch (Flags & {})\n  {{\n",
            mask_ident(prefix, group)
        ));
        for label in &group.labels {
            let case_pad = prefix.len() + width - label.len();
            out.push_str(&format!(
                "    case {}{}: {:case_pad$}return \"[{:<width$}]\";\n",
                prefix, label, "", label
            ));
        }
        out.push_str("  }\n");
        out.push_str(&format!("  return \"[{}]\";\n", " ".repeat(width)));
        out.push_str("}\n\n");
    }
    out
}

/// Identifier of a group's mask constant: prefix plus uppercased group name.
fn mask_ident(prefix: &str, group: &GroupLayout) -> String {
    format!("{}{}", prefix, group.name.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GroupSpec;
    use crate::toml_parser::OnChange;

    fn config(mode: GenerationMode, groups: Vec<GroupSpec>) -> (LoggenConfig, Layout) {
        let layout = Layout::compute(mode, &groups).unwrap();
        let config = LoggenConfig {
            prefix: "LOG_".to_string(),
            mode,
            on_change: OnChange::Error,
            verbosity_symbol: "GlobalVerbosity".to_string(),
            macro_name: "Log".to_string(),
            groups,
        };
        (config, layout)
    }

    fn three_axis() -> (LoggenConfig, Layout) {
        config(
            GenerationMode::BitFlags,
            vec![
                GroupSpec::new("Priorities", &["VERBOSE", "INFO", "WARN", "ERROR", "FATAL"]),
                GroupSpec::new("Subsystems", &["PLATFORM", "AUDIO", "VIDEO", "NETWORK"]),
                GroupSpec::new("Subcategories", &["INIT", "SHUTDOWN", "ACTIVATE", "DEACTIVATE"]),
            ],
        )
    }

    fn single_verbosity() -> (LoggenConfig, Layout) {
        config(
            GenerationMode::BitGroups,
            vec![GroupSpec::new("Verbosity", &["Verbose", "Debug", "Error"])],
        )
    }

    #[test]
    fn diagram_boundary_columns_match_max_bits() {
        let (_, layout) = three_axis();
        let diagram = render_diagram(&layout);
        let lines: Vec<&str> = diagram.lines().collect();

        // "/*", then one annotation per group, then the marker row.
        let marker = lines[1 + layout.groups.len()].as_bytes();
        let arrows = lines[2 + layout.groups.len()].as_bytes();
        for group in &layout.groups {
            let column = 34 - group.max_bit as usize;
            assert_eq!(marker[column], b'|', "boundary for {}", group.name);
            assert_eq!(arrows[column], b'v', "arrow for {}", group.name);
        }
    }

    #[test]
    fn diagram_annotates_groups_highest_range_first() {
        let (_, layout) = three_axis();
        let diagram = render_diagram(&layout);
        let lines: Vec<&str> = diagram.lines().collect();

        assert!(lines[1].contains("Subcategories (bits 9-13)"));
        assert!(lines[2].contains("Subsystems (bits 5-9)"));
        assert!(lines[3].contains("Priorities (bits 0-5)"));
        assert!(lines.last().unwrap().starts_with("*/"));
    }

    #[test]
    fn diagram_marks_the_verbosity_group_in_grouped_mode() {
        let (_, layout) = single_verbosity();
        let diagram = render_diagram(&layout);
        assert!(diagram.contains("Verbosity (bits 0-2) <-- Used for global verbosity"));
    }

    #[test]
    fn enum_emits_shifted_constants_in_flags_mode() {
        let (config, layout) = three_axis();
        let block = render_enum(&config, &layout);

        assert!(block.contains("LOG_VERBOSE"));
        assert!(block.contains("= 1 <<  0,"));
        assert!(block.contains("= 1 <<  5,")); // PLATFORM
        assert!(block.contains("= 1 <<  9,")); // INIT
        assert!(block.contains("= 1 << 12,")); // DEACTIVATE
    }

    #[test]
    fn enum_emits_masks_and_everything_last() {
        let (config, layout) = three_axis();
        let block = render_enum(&config, &layout);

        assert!(block.contains("LOG_PRIORITIES"));
        assert!(block.contains("0x0000001f"));
        assert!(block.contains("0x000001e0"));
        assert!(block.contains("0x00001e00"));
        assert!(block.contains("/* (bits 00-04) */"));
        assert!(block.contains("/* (bits 09-12) */"));

        let everything = block.find("LOG_EVERYTHING").unwrap();
        let last_mask = block.rfind("LOG_SUBCATEGORIES").unwrap();
        assert!(everything > last_mask);
        assert!(block.contains("LOG_EVERYTHING"));
        assert!(block.contains("0x7fffffff"));
        assert!(block.trim_end().ends_with("};"));
    }

    #[test]
    fn enum_emits_hex_values_in_grouped_mode() {
        let (config, layout) = single_verbosity();
        let block = render_enum(&config, &layout);

        assert!(block.contains("LOG_Verbose"));
        assert!(block.contains("= 0x00000000,"));
        assert!(block.contains("= 0x00000001,"));
        assert!(block.contains("= 0x00000002,"));
        assert!(block.contains("LOG_VERBOSITY"));
        assert!(block.contains("0x00000003")); // mask over bits [0, 2)
    }

    #[test]
    fn macro_binds_labels_and_guards_on_bit_intersection() {
        let (config, layout) = three_axis();
        let body = render_log_macro(&config, &layout);

        assert!(body.starts_with("#define Log(Flags, Format, ...) \\"));
        assert!(body.contains("int VERBOSE    = LOG_VERBOSE; \\"));
        assert!(body.contains("int DEACTIVATE = LOG_DEACTIVATE; \\"));
        assert!(body.contains("if ((Flags) & GlobalVerbosity) { \\"));
        assert!(body.contains("printf(\"%s%s%s %12.12s:%4i \" Format \"\\n\", \\"));
        assert!(body.contains(
            "LOG_PrioritiesLabel(Flags), LOG_SubsystemsLabel(Flags), LOG_SubcategoriesLabel(Flags)"
        ));
        assert!(body.contains("__FILE__, __LINE__, ##__VA_ARGS__); \\"));
    }

    #[test]
    fn macro_guards_on_masked_threshold_in_grouped_mode() {
        let (config, layout) = single_verbosity();
        let body = render_log_macro(&config, &layout);

        assert!(
            body.contains("if (((Flags) & LOG_VERBOSITY) >= (GlobalVerbosity & LOG_VERBOSITY)) { \\")
        );
    }

    #[test]
    fn macro_name_and_verbosity_symbol_are_configurable() {
        let (mut config, layout) = three_axis();
        config.macro_name = "TraceEvent".to_string();
        config.verbosity_symbol = "g_LogThreshold".to_string();

        let body = render_log_macro(&config, &layout);
        assert!(body.starts_with("#define TraceEvent(Flags, Format, ...) \\"));
        assert!(body.contains("if ((Flags) & g_LogThreshold) { \\"));

        let header = generate_header(&config, &layout);
        assert!(header.contains("extern int g_LogThreshold;"));
    }

    #[test]
    fn label_functions_switch_on_the_group_mask() {
        let (config, layout) = three_axis();
        let body = render_label_functions(&config, &layout);

        assert!(body.contains("static inline const char* LOG_PrioritiesLabel(int Flags)"));
        assert!(body.contains("switch (Flags & LOG_PRIORITIES)"));
        assert!(body.contains("case LOG_VERBOSE:"));
        assert!(body.contains("return \"[VERBOSE]\";"));
        // INFO padded to the group's widest label (VERBOSE).
        assert!(body.contains("return \"[INFO   ]\";"));
    }

    #[test]
    fn label_functions_fall_back_to_blank_brackets() {
        let (config, layout) = three_axis();
        let body = render_label_functions(&config, &layout);

        // Priorities group: width 7 blanks; Subcategories group: width 10.
        assert!(body.contains("return \"[       ]\";"));
        assert!(body.contains("return \"[          ]\";"));
    }

    #[test]
    fn label_functions_preserve_label_casing() {
        let (config, layout) = single_verbosity();
        let body = render_label_functions(&config, &layout);

        assert!(body.contains("static inline const char* LOG_VerbosityLabel(int Flags)"));
        assert!(body.contains("return \"[Verbose]\";"));
        assert!(body.contains("return \"[Debug  ]\";"));
    }

    #[test]
    fn header_sections_come_in_fixed_order() {
        let (config, layout) = three_axis();
        let header = generate_header(&config, &layout);

        let diagram = header.find("/*").unwrap();
        let extern_decl = header.find("extern int GlobalVerbosity;").unwrap();
        let enum_block = header.find("enum\n{").unwrap();
        let log_macro = header.find("#define Log(").unwrap();
        let label_fn = header.find("static inline const char*").unwrap();

        assert!(diagram < extern_decl);
        assert!(extern_decl < enum_block);
        assert!(enum_block < log_macro);
        assert!(log_macro < label_fn);
    }

    #[test]
    fn empty_prefix_emits_bare_identifiers() {
        let (mut config, layout) = three_axis();
        config.prefix = String::new();

        let header = generate_header(&config, &layout);
        assert!(header.contains("case VERBOSE:"));
        assert!(header.contains("switch (Flags & PRIORITIES)"));
        assert!(header.contains("static inline const char* PrioritiesLabel(int Flags)"));
    }
}
