//! Named registry of flag-value parsers.
//!
//! A registered parser consumes a flag's full raw value and produces the
//! canonical string handed to the field's [`Bind`](crate::Bind)
//! implementation. The registry ships `json` (syntax-validating
//! pass-through) and `jsonfile` (reads the named file and yields its
//! contents). Registration is append-only: re-registering a key is a
//! construction error.

use std::collections::BTreeMap;

use crate::error::CliError;
use crate::value::CoerceError;

/// A parser for one flag's full string value.
pub trait FlagParser {
    /// Transforms the raw token into the string the field decodes.
    ///
    /// # Errors
    ///
    /// Returns a [`CoerceError`] attached verbatim to the owning flag.
    fn parse(&mut self, raw: &str) -> Result<String, CoerceError>;
}

type ParserFactory = Box<dyn Fn() -> Box<dyn FlagParser> + Send + Sync>;

/// Registry mapping parser keys to factories.
///
/// Built once and attached to the command tree; every parse invocation
/// creates fresh parser instances, so concurrent dispatches never share
/// parser state.
pub struct ParserRegistry {
    creators: BTreeMap<String, ParserFactory>,
}

impl ParserRegistry {
    /// A registry holding the builtin `json` and `jsonfile` parsers.
    #[must_use]
    pub fn new() -> Self {
        let mut creators: BTreeMap<String, ParserFactory> = BTreeMap::new();
        creators.insert(
            "json".to_owned(),
            Box::new(|| Box::new(JsonParser) as Box<dyn FlagParser>),
        );
        creators.insert(
            "jsonfile".to_owned(),
            Box::new(|| Box::new(JsonFileParser) as Box<dyn FlagParser>),
        );
        Self { creators }
    }

    /// Registers a parser factory under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::DuplicateParser`] when `name` is already taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), CliError>
    where
        F: Fn() -> Box<dyn FlagParser> + Send + Sync + 'static,
    {
        let key = name.into();
        if self.creators.contains_key(&key) {
            return Err(CliError::DuplicateParser { name: key });
        }
        self.creators.insert(key, Box::new(factory));
        Ok(())
    }

    /// Builds a fresh parser for `name`, if registered.
    pub(crate) fn create(&self, name: &str) -> Option<Box<dyn FlagParser>> {
        self.creators.get(name).map(|factory| factory())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates that the value is well-formed JSON and passes it through.
struct JsonParser;

impl FlagParser for JsonParser {
    fn parse(&mut self, raw: &str) -> Result<String, CoerceError> {
        serde_json::from_str::<serde::de::IgnoredAny>(raw)
            .map_err(|e| CoerceError::Custom(e.to_string()))?;
        Ok(raw.to_owned())
    }
}

/// Reads the file named by the value and yields its contents.
struct JsonFileParser;

impl FlagParser for JsonFileParser {
    fn parse(&mut self, raw: &str) -> Result<String, CoerceError> {
        std::fs::read_to_string(raw).map_err(|e| CoerceError::Custom(format!("{raw}: {e}")))
    }
}
