//! Parsing of field annotations into normalised flag specifications.
//!
//! An annotation such as `"*h,help"` names the flags a record field binds
//! to: a leading `*` marks the field required, a leading `!` marks it as a
//! help flag, single-character names become short flags (`-h`) and longer
//! names become long flags (`--help`). A field annotated with the literal
//! `-` is excluded from binding entirely.

/// Normalised description of one bindable flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FieldSpec {
    /// Parsing fails when the field is never assigned.
    pub(crate) required: bool,
    /// Assigning this flag true suppresses required-field validation.
    pub(crate) is_help: bool,
    /// Short names, each with its `-` prefix, in annotation order.
    pub(crate) short_names: Vec<String>,
    /// Long names, each with its `--` prefix, in annotation order.
    pub(crate) long_names: Vec<String>,
    /// One-line usage text.
    pub(crate) usage: String,
    /// Default value literal or environment expression, verbatim.
    pub(crate) default_value: String,
    /// Placeholder shown for the value in usage text, e.g. `--cfg=<name>`.
    pub(crate) placeholder: String,
    /// Key of a registered flag parser to route values through.
    pub(crate) parser_ref: Option<String>,
}

/// Result of parsing one field annotation.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SpecOutcome {
    /// The field binds to the contained specification.
    Bound(FieldSpec),
    /// The field is intentionally excluded from binding.
    Excluded,
}

impl FieldSpec {
    /// Parses `annotation` for the field named `ident`.
    ///
    /// A missing or name-less annotation synthesises a single long flag from
    /// the field identifier. Any name token equal to `-` excludes the field;
    /// the comparison is against the full trimmed token, since a `-` name
    /// would be indistinguishable from the option terminator.
    pub(crate) fn parse(ident: &str, annotation: Option<&str>) -> SpecOutcome {
        let mut spec = Self::default();
        let mut rest = annotation.unwrap_or("").trim();
        loop {
            if let Some(after) = rest.strip_prefix('*') {
                spec.required = true;
                rest = after.trim_start();
            } else if let Some(after) = rest.strip_prefix('!') {
                spec.is_help = true;
                rest = after.trim_start();
            } else {
                break;
            }
        }

        let mut named = false;
        for token in rest.split(',') {
            let name = token.trim();
            if name == "-" {
                return SpecOutcome::Excluded;
            }
            if name.is_empty() {
                continue;
            }
            if name.chars().count() == 1 {
                spec.short_names.push(format!("-{name}"));
            } else {
                spec.long_names.push(format!("--{name}"));
            }
            named = true;
        }
        if !named {
            spec.long_names.push(format!("--{ident}"));
        }
        SpecOutcome::Bound(spec)
    }

    /// All names in registration order: short names first, then long.
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.short_names
            .iter()
            .chain(self.long_names.iter())
            .map(String::as_str)
    }
}
