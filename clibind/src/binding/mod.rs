//! The binding engine: field descriptor tables and token-stream parsing.
//!
//! A record opts into binding by implementing [`FlagRecord`], returning one
//! [`FieldDecl`] per bindable field. [`FlagSet::bind`] builds the name
//! index from those descriptors, applies defaults, drives the token-stream
//! state machine and validates required fields, leaving the bound values in
//! the record itself.

mod default_expr;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use crate::error::CliError;
use crate::fieldspec::{FieldSpec, SpecOutcome};
use crate::registry::{FlagParser, ParserRegistry};
use crate::value::Bind;

/// A record whose fields can be bound from a token stream.
///
/// Implementations list one descriptor per field, in declaration order.
/// Fields of composite types that should contribute their own flags are
/// flattened with [`FieldDecl::embed`].
///
/// ```
/// use clibind::{FieldDecl, FlagRecord, FlagSet, ParserRegistry};
///
/// #[derive(Default)]
/// struct ServeArgs {
///     host: String,
///     port: u16,
///     verbose: bool,
/// }
///
/// impl FlagRecord for ServeArgs {
///     fn fields(&mut self) -> Vec<FieldDecl<'_>> {
///         vec![
///             FieldDecl::value("host", &mut self.host)
///                 .named("H,host")
///                 .usage("bind address")
///                 .default_value("0.0.0.0"),
///             FieldDecl::value("port", &mut self.port)
///                 .named("p,port")
///                 .usage("listen port")
///                 .default_value("8080"),
///             FieldDecl::value("verbose", &mut self.verbose).named("v"),
///         ]
///     }
/// }
///
/// # fn main() -> Result<(), clibind::CliError> {
/// let mut args = ServeArgs::default();
/// let registry = ParserRegistry::new();
/// let outcome = FlagSet::bind(&mut args, ["-p", "9090", "-v"], &registry)?;
/// assert_eq!(args.host, "0.0.0.0");
/// assert_eq!(args.port, 9090);
/// assert!(args.verbose);
/// assert!(outcome.free_args().is_empty());
/// # Ok(())
/// # }
/// ```
pub trait FlagRecord: Any {
    /// The field descriptor table, in declaration order.
    fn fields(&mut self) -> Vec<FieldDecl<'_>>;

    /// Record-level validation, run after a successful bind.
    ///
    /// # Errors
    ///
    /// Return any [`CliError`] to fail the dispatch; it is surfaced as the
    /// invocation's terminal error.
    fn validate(&self) -> Result<(), CliError> {
        Ok(())
    }

    /// Whether the bound record asks for usage text instead of a run.
    ///
    /// Records embedding [`Helper`](crate::Helper) should delegate here.
    fn wants_help(&self) -> bool {
        false
    }
}

/// One field's binding declaration.
pub struct FieldDecl<'a> {
    pub(crate) target: DeclTarget<'a>,
    pub(crate) ident: String,
    pub(crate) annotation: Option<String>,
    pub(crate) usage: String,
    pub(crate) default_value: String,
    pub(crate) placeholder: String,
    pub(crate) parser: Option<String>,
}

pub(crate) enum DeclTarget<'a> {
    Value(&'a mut dyn Bind),
    Record(&'a mut dyn FlagRecord),
}

impl<'a> FieldDecl<'a> {
    /// Declares a directly bound field.
    ///
    /// Without a [`named`](Self::named) annotation the field binds to a
    /// single long flag synthesised from `ident`.
    pub fn value(ident: impl Into<String>, target: &'a mut dyn Bind) -> Self {
        Self {
            target: DeclTarget::Value(target),
            ident: ident.into(),
            annotation: None,
            usage: String::new(),
            default_value: String::new(),
            placeholder: String::new(),
            parser: None,
        }
    }

    /// Declares an embedded record whose fields are flattened into the
    /// enclosing binding.
    pub fn embed(record: &'a mut dyn FlagRecord) -> Self {
        Self {
            target: DeclTarget::Record(record),
            ident: String::new(),
            annotation: None,
            usage: String::new(),
            default_value: String::new(),
            placeholder: String::new(),
            parser: None,
        }
    }

    /// Sets the flag-name annotation, e.g. `"*h,help"`.
    #[must_use]
    pub fn named(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Sets the one-line usage text.
    #[must_use]
    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = text.into();
        self
    }

    /// Sets the default value literal or environment expression.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Sets the placeholder shown for the value in usage text.
    #[must_use]
    pub fn placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder = name.into();
        self
    }

    /// Routes values through the named registered parser.
    #[must_use]
    pub fn parser(mut self, name: impl Into<String>) -> Self {
        self.parser = Some(name.into());
        self
    }
}

/// Multi-valued map of assigned flag names to their final string
/// representations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    /// The first value recorded under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values recorded under `name`.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0.get(name).map_or(&[], Vec::as_slice)
    }

    /// Whether any value has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn set(&mut self, name: &str, value: String) {
        self.0.insert(name.to_owned(), vec![value]);
    }
}

/// One live bound field during a parse.
struct BoundFlag<'a> {
    spec: FieldSpec,
    value: &'a mut dyn Bind,
    parser: Option<Box<dyn FlagParser>>,
    assigned: bool,
    actual: Option<String>,
    error: Option<crate::value::CoerceError>,
}

impl BoundFlag<'_> {
    fn display_name(&self) -> String {
        if let Some(actual) = &self.actual {
            return actual.clone();
        }
        self.spec
            .long_names
            .first()
            .or_else(|| self.spec.short_names.first())
            .cloned()
            .unwrap_or_default()
    }

    fn set(&mut self, actual: &str, raw: &str) -> Result<(), crate::value::CoerceError> {
        self.assigned = true;
        if !actual.is_empty() {
            self.actual = Some(actual.to_owned());
        }
        let cooked = match &mut self.parser {
            Some(parser) => parser.parse(raw)?,
            None => raw.to_owned(),
        };
        self.value.assign(&cooked)
    }

    fn apply(&mut self, actual: &str, raw: &str, values: &mut FormValues) {
        match self.set(actual, raw) {
            Ok(()) => values.set(actual, self.value.encode()),
            Err(e) => self.error = Some(e),
        }
    }
}

/// Outcome of binding one token stream against one record.
///
/// One instance exists per parse invocation; bound values live in the
/// record that was passed to [`FlagSet::bind`].
#[derive(Debug, Default)]
pub struct FlagSet {
    free_args: Vec<String>,
    values: FormValues,
    validation_suppressed: bool,
}

impl FlagSet {
    /// Binds `args` against `record`'s descriptor table.
    ///
    /// Defaults are applied before any token is consumed, so an explicit
    /// token always overrides them. All coercion failures and missing
    /// required fields are collected into a single terminal error;
    /// structural token errors (an undefined flag, a non-boolean fold
    /// target, too many values in one token) abort the scan immediately.
    ///
    /// # Errors
    ///
    /// Returns a construction error for duplicate flag names or an unknown
    /// parser reference, and a binding error for everything the scan and
    /// validation phases reject.
    pub fn bind<I, S>(
        record: &mut dyn FlagRecord,
        args: I,
        registry: &ParserRegistry,
    ) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut flags = Vec::new();
        let mut index = HashMap::new();
        collect_fields(record, registry, &mut flags, &mut index)?;

        let mut outcome = Self::default();
        for flag in &flags {
            if flag.assigned {
                if let Some(first) = flag.spec.names().next() {
                    outcome.values.set(first, flag.value.encode());
                }
            }
        }

        outcome.scan(&args, &mut flags, &index)?;
        outcome.finalize(&mut flags)?;
        Ok(outcome)
    }

    /// Collects free arguments from a token stream with no record to bind,
    /// for commands without an argument record.
    ///
    /// Non-flag tokens are kept; after a literal `--` every remaining token
    /// is kept verbatim. Flag-shaped tokens cannot be an error here, since
    /// there are no fields they could have named.
    pub(crate) fn free_only(args: &[String]) -> Self {
        let mut outcome = Self::default();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            i += 1;
            if arg == "--" {
                outcome
                    .free_args
                    .extend(args.get(i..).unwrap_or(&[]).iter().cloned());
                break;
            }
            if !arg.starts_with('-') {
                outcome.free_args.push(arg.clone());
            }
        }
        outcome
    }

    /// Tokens that were not consumed as flags or flag values.
    #[must_use]
    pub fn free_args(&self) -> &[String] {
        &self.free_args
    }

    /// Final string representations of every assigned flag.
    #[must_use]
    pub const fn values(&self) -> &FormValues {
        &self.values
    }

    /// Whether a help flag suppressed required-field validation.
    #[must_use]
    pub const fn validation_suppressed(&self) -> bool {
        self.validation_suppressed
    }

    fn scan(
        &mut self,
        args: &[String],
        flags: &mut [BoundFlag<'_>],
        index: &HashMap<String, usize>,
    ) -> Result<(), CliError> {
        let mut i = 0;
        'scan: while i < args.len() {
            let arg = &args[i];
            i += 1;

            if !arg.starts_with('-') {
                self.free_args.push(arg.clone());
                continue;
            }
            if arg == "--" {
                self.free_args.extend(args.get(i..).unwrap_or(&[]).iter().cloned());
                break;
            }

            let parts: Vec<&str> = arg.split('=').collect();
            let name = parts.first().copied().unwrap_or("");

            if let Some(&at) = index.get(name) {
                match parts.as_slice() {
                    [_, attached] => flags[at].apply(name, attached, &mut self.values),
                    [_] => {
                        // A bare boolean asserts itself; only non-boolean
                        // flags consume the next token as their value.
                        if flags[at].value.is_boolean() {
                            flags[at].apply(name, "", &mut self.values);
                        } else {
                            let next = args.get(i).filter(|n| !n.starts_with('-')).cloned();
                            if let Some(value) = next {
                                i += 1;
                                flags[at].apply(name, &value, &mut self.values);
                            } else {
                                flags[at].apply(name, "", &mut self.values);
                            }
                        }
                    }
                    many => {
                        return Err(CliError::TooManyValues {
                            name: name.to_owned(),
                            count: many.len() - 1,
                        });
                    }
                }
                continue;
            }

            // Long flags are never decomposed.
            if name.starts_with("--") {
                return Err(CliError::undefined(name));
            }

            let body = name.strip_prefix('-').unwrap_or(name);
            let mut chars = body.chars();
            let Some(first) = chars.next() else {
                return Err(CliError::undefined(name));
            };

            // Siamese form: `-F<value>` for a known non-boolean short flag.
            let head = format!("-{first}");
            if let Some(&at) = index.get(&head) {
                if !flags[at].value.is_boolean() {
                    flags[at].apply(&head, chars.as_str(), &mut self.values);
                    continue;
                }
            }

            // Fold group: every remaining character must name a boolean.
            for c in body.chars() {
                let short = format!("-{c}");
                match index.get(&short) {
                    None => return Err(CliError::undefined(short.as_str())),
                    Some(&at) if !flags[at].value.is_boolean() => {
                        return Err(CliError::NonBooleanFold { name: short });
                    }
                    Some(&at) => flags[at].apply(&short, "", &mut self.values),
                }
            }
            continue 'scan;
        }
        Ok(())
    }

    fn finalize(&mut self, flags: &mut [BoundFlag<'_>]) -> Result<(), CliError> {
        self.validation_suppressed = flags
            .iter()
            .any(|f| f.spec.is_help && f.value.as_bool().unwrap_or(false));

        let mut failures: Vec<CliError> = flags
            .iter_mut()
            .filter_map(|f| {
                let name = f.display_name();
                f.error.take().map(|e| CliError::invalid(name, e))
            })
            .collect();

        if !self.validation_suppressed {
            let missing: Vec<String> = flags
                .iter()
                .filter(|f| f.spec.required && !f.assigned)
                .map(BoundFlag::display_name)
                .collect();
            if !missing.is_empty() {
                failures.push(CliError::MissingRequired { names: missing });
            }
        }

        match CliError::try_aggregate(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Walks the descriptor table, recursing into embedded records, building
/// the bound-flag list and the name index.
fn collect_fields<'a>(
    record: &'a mut dyn FlagRecord,
    registry: &ParserRegistry,
    flags: &mut Vec<BoundFlag<'a>>,
    index: &mut HashMap<String, usize>,
) -> Result<(), CliError> {
    for decl in record.fields() {
        match decl.target {
            DeclTarget::Record(embedded) => {
                collect_fields(embedded, registry, flags, index)?;
            }
            DeclTarget::Value(value) => {
                let mut spec = match FieldSpec::parse(&decl.ident, decl.annotation.as_deref()) {
                    SpecOutcome::Bound(spec) => spec,
                    SpecOutcome::Excluded => continue,
                };
                spec.usage = decl.usage;
                spec.default_value = decl.default_value;
                spec.placeholder = decl.placeholder;
                spec.parser_ref = decl.parser;

                let parser = match &spec.parser_ref {
                    Some(key) => Some(registry.create(key).ok_or_else(|| {
                        CliError::UnknownParser { name: key.clone() }
                    })?),
                    None => None,
                };

                let mut flag = BoundFlag {
                    spec,
                    value,
                    parser,
                    assigned: false,
                    actual: None,
                    error: None,
                };

                if !flag.spec.default_value.is_empty() && flag.value.is_zero() {
                    let resolved = default_expr::resolve(&flag.spec.default_value)
                        .map_err(|e| CliError::invalid(flag.display_name(), e))?;
                    if let Some(text) = resolved {
                        flag.set("", &text)
                            .map_err(|e| CliError::invalid(flag.display_name(), e))?;
                    }
                }

                let at = flags.len();
                for flag_name in flag.spec.names() {
                    if index.contains_key(flag_name) {
                        return Err(CliError::DuplicateFlag {
                            name: flag_name.to_owned(),
                        });
                    }
                    index.insert(flag_name.to_owned(), at);
                }
                flags.push(flag);
            }
        }
    }
    Ok(())
}

/// Builds the bound-flag specifications for a record without parsing any
/// tokens, for usage rendering.
pub(crate) fn collect_specs(
    record: &mut dyn FlagRecord,
    registry: &ParserRegistry,
) -> Result<Vec<FieldSpec>, CliError> {
    let mut flags = Vec::new();
    let mut index = HashMap::new();
    collect_fields(record, registry, &mut flags, &mut index)?;
    Ok(flags.into_iter().map(|f| f.spec).collect())
}

#[cfg(test)]
mod tests;
