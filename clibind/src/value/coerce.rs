//! Token-to-value coercion heuristics.
//!
//! These are compatibility contracts, not general-purpose parsers: the
//! boolean token table, the integer overflow classification and the
//! `key=value` split behave exactly as consuming applications observe them.

use thiserror::Error;

/// A coercion failure for one flag value.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoerceError {
    /// The token is not syntactically a value of the wanted type.
    #[error("`{token}` could not be parsed as a {want} value")]
    Parse {
        /// The offending token.
        token: String,
        /// Human-readable name of the wanted type.
        want: &'static str,
    },

    /// The token parsed but does not fit the destination width.
    #[error("value overflow")]
    Overflow,

    /// A map entry token carried neither key nor value.
    #[error("empty key=value pair")]
    EmptyKeyValue,

    /// A custom decoder or registered parser rejected the token.
    #[error("{0}")]
    Custom(String),
}

impl CoerceError {
    pub(crate) fn parse(token: &str, want: &'static str) -> Self {
        Self::Parse {
            token: token.to_owned(),
            want,
        }
    }
}

/// Decodes a boolean token.
///
/// The empty token decodes to `true` so that a bare boolean flag asserts
/// itself. `yes`/`y` and `no`/`not`/`none`/`n` are accepted alongside
/// `true`/`false`; any other token must be an integer, where non-zero means
/// `true`.
pub(crate) fn parse_bool(token: &str) -> Result<bool, CoerceError> {
    match token {
        "" | "true" | "yes" | "y" => Ok(true),
        "false" | "no" | "not" | "none" | "n" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| CoerceError::parse(other, "bool")),
    }
}

/// Decodes a signed integer token and range-checks it against `bits`.
///
/// The token is always parsed with the full 64-bit range first; a parse
/// failure and an out-of-range value are distinct errors.
pub(crate) fn parse_int(token: &str, bits: u32) -> Result<i64, CoerceError> {
    let value = token
        .parse::<i64>()
        .map_err(|_| CoerceError::parse(token, "int"))?;
    let fits = match bits {
        8 => i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX),
        16 => i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX),
        32 => i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX),
        _ => true,
    };
    if fits { Ok(value) } else { Err(CoerceError::Overflow) }
}

/// Decodes an unsigned integer token and range-checks it against `bits`.
pub(crate) fn parse_uint(token: &str, bits: u32) -> Result<u64, CoerceError> {
    let value = token
        .parse::<u64>()
        .map_err(|_| CoerceError::parse(token, "uint"))?;
    let fits = match bits {
        8 => value <= u64::from(u8::MAX),
        16 => value <= u64::from(u16::MAX),
        32 => value <= u64::from(u32::MAX),
        _ => true,
    };
    if fits { Ok(value) } else { Err(CoerceError::Overflow) }
}

/// Decodes a float token, range-checking against f32 bounds when `bits`
/// is 32.
pub(crate) fn parse_float(token: &str, bits: u32) -> Result<f64, CoerceError> {
    let value = token
        .parse::<f64>()
        .map_err(|_| CoerceError::parse(token, "float"))?;
    if bits == 32 && value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(CoerceError::Overflow);
    }
    Ok(value)
}

/// Splits a map entry token on its first `=`.
///
/// A bare `key` yields an implicit empty value; an empty token is an error.
pub(crate) fn split_key_value(token: &str) -> Result<(&str, &str), CoerceError> {
    if token.is_empty() {
        return Err(CoerceError::EmptyKeyValue);
    }
    Ok(token.split_once('=').unwrap_or((token, "")))
}
