//! Rendering of bound flag collections into aligned help text.

use crate::binding::{FlagRecord, collect_specs};
use crate::error::CliError;
use crate::fieldspec::FieldSpec;
use crate::palette::Palette;
use crate::registry::ParserRegistry;

const SEP: &str = ", ";

/// Layout style for rendered usage text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UsageStyle {
    /// Left-right columns: names, placeholder and default, usage text.
    #[default]
    Row,
    /// Up-down: a names line followed by an indented usage line.
    Manual,
}

/// Renders usage text for a record's flags.
///
/// Building the descriptor table applies defaults, so the record passed
/// here is typically a fresh instance from the command's factory.
///
/// # Errors
///
/// Returns the construction error when the record's descriptor table is
/// invalid (duplicate names, unknown parser reference).
pub fn record_usage(
    record: &mut dyn FlagRecord,
    registry: &ParserRegistry,
    palette: &Palette,
    style: UsageStyle,
) -> Result<String, CliError> {
    let specs = collect_specs(record, registry)?;
    Ok(match style {
        UsageStyle::Row => render_row(&specs, palette),
        UsageStyle::Manual => render_manual(&specs, palette),
    })
}

fn render_row(specs: &[FieldSpec], palette: &Palette) -> String {
    let sep_len = SEP.len();
    let mut len_short = 0usize;
    let mut len_block = 0usize;
    for spec in specs {
        let shorts: usize = spec.short_names.iter().map(|n| n.len() + sep_len).sum();
        len_short = len_short.max(shorts);
        let mut block: usize = spec.long_names.iter().map(|n| n.len() + sep_len).sum();
        if !spec.default_value.is_empty() {
            block += spec.default_value.len() + 3;
        }
        if !spec.placeholder.is_empty() {
            block += spec.placeholder.len() + 1;
        }
        len_block = len_block.max(block);
    }

    let mut out = String::new();
    for spec in specs {
        let short_str = spec.short_names.join(SEP);
        let long_str = spec.long_names.join(SEP);
        let default_plain = if spec.default_value.is_empty() {
            String::new()
        } else {
            format!("[={}]", spec.default_value)
        };
        let name_len = if spec.placeholder.is_empty() {
            0
        } else {
            spec.placeholder.len() + 1
        };
        let usage_prefix = if spec.required {
            palette.red("*")
        } else {
            " ".to_owned()
        };
        let usage_text = format!("{usage_prefix}{}", spec.usage);

        // Alignment is measured on plain text; highlighting is applied after.
        let space = (sep_len + len_block)
            .saturating_sub(name_len + default_plain.len() + long_str.len());
        let default_col = if default_plain.is_empty() {
            String::new()
        } else {
            palette.grey(&default_plain)
        };
        let name_col = if spec.placeholder.is_empty() {
            String::new()
        } else {
            format!("={}", palette.bold(&spec.placeholder))
        };

        if long_str.is_empty() {
            let fill = pad(&format!("{name_col}{default_col}"), space);
            out.push_str(&format!(
                "{short_str:>len_short$}{fill}{gap}{usage_text}\n",
                gap = " ".repeat(sep_len)
            ));
        } else if short_str.is_empty() {
            let fill = pad(&format!("{long_str}{name_col}{default_col}"), space);
            let lead = len_short + sep_len;
            out.push_str(&format!("{:>lead$}{fill}{usage_text}\n", ""));
        } else {
            let fill = pad(&format!("{long_str}{name_col}{default_col}"), space);
            out.push_str(&format!(
                "{short_str:>len_short$}{SEP}{fill}{usage_text}\n"
            ));
        }
    }
    out
}

fn render_manual(specs: &[FieldSpec], palette: &Palette) -> String {
    let mut out = String::new();
    for (i, spec) in specs.iter().enumerate() {
        if i != 0 {
            out.push('\n');
        }
        let names: Vec<&str> = spec.names().collect();
        out.push_str("  ");
        out.push_str(&palette.bold(&names.join(SEP)));
        if !spec.placeholder.is_empty() {
            out.push('=');
            out.push_str(&palette.bold(&spec.placeholder));
        }
        if !spec.default_value.is_empty() {
            out.push_str(&palette.grey(&format!("[={}]", spec.default_value)));
        }
        out.push('\n');
        out.push_str("      ");
        if spec.required {
            out.push_str(&palette.red("*"));
        }
        out.push_str(&spec.usage);
        out.push('\n');
    }
    out
}

fn pad(text: &str, spaces: usize) -> String {
    format!("{text}{}", " ".repeat(spaces))
}
