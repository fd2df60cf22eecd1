//! Palette-aware rendering of errors for terminal and bridge output.

use crate::palette::Palette;

use super::CliError;

impl CliError {
    /// Renders the error with highlighted flag and command names.
    ///
    /// Not-found errors gain an appended suggestion block. Rendering with
    /// [`Palette::plain`] yields the same text without escape sequences.
    #[must_use]
    pub fn render(&self, palette: &Palette) -> String {
        match self {
            Self::CommandNotFound { path, suggestions } => {
                let mut out = format!("command {} not found", palette.yellow(path));
                out.push_str(&suggestion_block(suggestions, palette));
                out
            }
            Self::MethodNotAllowed { method } => {
                format!("method {} not allowed", palette.yellow(method))
            }
            Self::UndefinedFlag { name } => {
                format!("undefined flag {}", palette.bold(name))
            }
            Self::NonBooleanFold { name } => format!(
                "every folded flag must be boolean, but {} is not",
                palette.bold(name)
            ),
            Self::TooManyValues { name, count } => {
                format!("flag {} received {count} values", palette.bold(name))
            }
            Self::DuplicateFlag { name } => {
                format!("duplicate flag name {}", palette.bold(name))
            }
            Self::InvalidValue { name, source } => {
                format!("argument {} invalid: {source}", palette.bold(name))
            }
            Self::MissingRequired { names } => {
                let lines: Vec<String> = names
                    .iter()
                    .map(|name| format!("required argument {} missing", palette.bold(name)))
                    .collect();
                lines.join("\n")
            }
            Self::Bind(failures) => {
                let lines: Vec<String> = failures.iter().map(|e| e.render(palette)).collect();
                lines.join("\n")
            }
            other => other.to_string(),
        }
    }
}

fn suggestion_block(suggestions: &[String], palette: &Palette) -> String {
    match suggestions {
        [] => String::new(),
        [only] => format!("\nDid you mean {}?", palette.bold(only)),
        many => {
            let mut out = String::from("\n\nDid you mean one of these?\n");
            for suggestion in many {
                out.push_str("    ");
                out.push_str(suggestion);
                out.push('\n');
            }
            out
        }
    }
}
