//! Primary error enum for binding and dispatch flows.

use std::fmt;

use thiserror::Error;

use crate::value::CoerceError;

/// Errors that can occur while wiring a command tree, binding a token
/// stream, or dispatching a command.
///
/// Construction failures (duplicate names, empty command names, duplicate
/// parser or route registrations) are reported when the tree or the binding
/// is assembled and should abort program initialisation. Binding and routing
/// failures are recoverable per invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    /// Two fields in one binding share a short or long flag name.
    #[error("duplicate flag name `{name}`")]
    DuplicateFlag {
        /// The colliding flag name, including its dash prefix.
        name: String,
    },

    /// A child command was registered without a name.
    #[error("command `{parent}` registered a child with an empty name")]
    EmptyCommandName {
        /// Name of the command the child was registered under.
        parent: String,
    },

    /// A child command's name or alias collides with an existing sibling.
    #[error("command `{parent}` already has a child named `{name}`")]
    DuplicateChild {
        /// Name of the command the child was registered under.
        parent: String,
        /// The colliding child name or alias.
        name: String,
    },

    /// A flag parser was registered under a key that is already taken.
    #[error("flag parser `{name}` is already registered")]
    DuplicateParser {
        /// The registry key.
        name: String,
    },

    /// A field annotation referenced a parser key that is not registered.
    #[error("flag parser `{name}` is not registered")]
    UnknownParser {
        /// The missing registry key.
        name: String,
    },

    /// An HTTP route alias was declared by more than one command.
    #[error("HTTP route `{route}` is already registered")]
    DuplicateRoute {
        /// The colliding route.
        route: String,
    },

    /// A token named a flag that is not registered.
    #[error("undefined flag `{name}`")]
    UndefinedFlag {
        /// The unknown flag name, including its dash prefix.
        name: String,
    },

    /// A folded short-flag group named a flag that is not boolean.
    #[error("every folded flag must be boolean, but `{name}` is not")]
    NonBooleanFold {
        /// The offending short flag.
        name: String,
    },

    /// A single token supplied more than one value for a flag.
    #[error("flag `{name}` received {count} values")]
    TooManyValues {
        /// The flag name from the token.
        name: String,
        /// How many values the token carried.
        count: usize,
    },

    /// A flag value could not be coerced into the field's type.
    #[error("argument `{name}` invalid: {source}")]
    InvalidValue {
        /// Name the flag was addressed by.
        name: String,
        /// The underlying coercion failure.
        #[source]
        source: CoerceError,
    },

    /// One or more required flags were never assigned.
    #[error("{}", missing_lines(.names))]
    MissingRequired {
        /// Display names of the unassigned required flags, in field
        /// declaration order.
        names: Vec<String>,
    },

    /// Several binding failures reported together.
    #[error("{0}")]
    Bind(Box<BindFailures>),

    /// No command matched the attempted path.
    #[error("command `{path}` not found")]
    CommandNotFound {
        /// The path that failed to route.
        path: String,
        /// Ranked near-miss command paths.
        suggestions: Vec<String>,
    },

    /// The matched command does not accept the request method.
    #[error("method `{method}` not allowed")]
    MethodNotAllowed {
        /// The rejected method.
        method: String,
    },

    /// Sentinel terminating the hook chain early without failing.
    #[error("exit")]
    Exit,

    /// A handler failed to write its output.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),

    /// A handler failed to encode JSON output.
    #[error("failed to encode JSON output: {0}")]
    Json(#[from] Box<serde_json::Error>),

    /// A handler or validator failure outside the taxonomy above.
    #[error("{message}")]
    Handler {
        /// The failure text.
        message: String,
    },
}

fn missing_lines(names: &[String]) -> String {
    let lines: Vec<String> = names
        .iter()
        .map(|name| format!("required argument `{name}` missing"))
        .collect();
    lines.join("\n")
}

impl CliError {
    /// Construct an [`CliError::InvalidValue`] for the given flag name.
    #[must_use]
    pub fn invalid(name: impl Into<String>, source: CoerceError) -> Self {
        Self::InvalidValue {
            name: name.into(),
            source,
        }
    }

    /// Construct an [`CliError::UndefinedFlag`].
    #[must_use]
    pub fn undefined(name: impl Into<String>) -> Self {
        Self::UndefinedFlag { name: name.into() }
    }

    /// Construct a handler failure from arbitrary text.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Collapse a list of failures into a single error.
    ///
    /// Returns `None` for an empty list, the inner error for a single
    /// failure, and [`CliError::Bind`] otherwise.
    #[must_use]
    pub fn try_aggregate(errors: Vec<Self>) -> Option<Self> {
        let mut failures = errors;
        match failures.len() {
            0 => None,
            1 => failures.pop(),
            _ => Some(Self::Bind(Box::new(BindFailures(failures)))),
        }
    }

    /// Whether this error is the early-exit sentinel.
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        matches!(self, Self::Exit)
    }
}

/// Collection of binding failures produced by a single parse.
#[derive(Debug, Default)]
pub struct BindFailures(Vec<CliError>);

impl BindFailures {
    /// Iterate over the contained failures.
    #[must_use = "iterators should be consumed to inspect errors"]
    pub fn iter(&self) -> impl Iterator<Item = &CliError> {
        self.0.iter()
    }

    /// Number of failures in the collection.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BindFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BindFailures {}

impl<'a> IntoIterator for &'a BindFailures {
    type Item = &'a CliError;
    type IntoIter = std::slice::Iter<'a, CliError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
