//! Environment-backed default value expressions.
//!
//! A default beginning with `$` names an environment variable; `$$` escapes
//! to a literal `$`. The variable reference may carry at most one suffix
//! operator: `/text` concatenates, `*N+M` and `*N-M` multiply then add,
//! in integer arithmetic when every operand is integral and in float
//! arithmetic otherwise.

use crate::value::CoerceError;

/// Resolves a default expression to the value to apply, if any.
///
/// Returns `Ok(None)` when the expression resolves to the empty string
/// (an unset or empty variable), in which case no default is applied.
///
/// # Errors
///
/// Returns a [`CoerceError`] when an arithmetic operator is applied to a
/// value or operand that is not numeric.
pub(crate) fn resolve(expr: &str) -> Result<Option<String>, CoerceError> {
    let Some(reference) = expr.strip_prefix('$') else {
        return Ok(non_empty(expr.to_owned()));
    };
    if let Some(literal) = reference.strip_prefix('$') {
        return Ok(non_empty(format!("${literal}")));
    }

    let (name, operator) = split_operator(reference);
    let raw = std::env::var(name).unwrap_or_default();
    let resolved = match operator {
        None => raw,
        Some(Operator::Concat(text)) => format!("{raw}{text}"),
        Some(Operator::Offset(offset)) => {
            if raw.is_empty() {
                return Ok(None);
            }
            apply_offset(&raw, offset)?
        }
    };
    Ok(non_empty(resolved))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

enum Operator<'a> {
    Concat(&'a str),
    Offset(&'a str),
}

fn split_operator(reference: &str) -> (&str, Option<Operator<'_>>) {
    for (i, c) in reference.char_indices() {
        match c {
            '/' => {
                let (name, rest) = reference.split_at(i);
                return (name, Some(Operator::Concat(rest.get(1..).unwrap_or(""))));
            }
            '*' => {
                let (name, rest) = reference.split_at(i);
                return (name, Some(Operator::Offset(rest.get(1..).unwrap_or(""))));
            }
            _ => {}
        }
    }
    (reference, None)
}

fn apply_offset(raw: &str, offset: &str) -> Result<String, CoerceError> {
    let split = offset
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '+' || c == '-');
    let Some((at, sign)) = split else {
        return Err(CoerceError::parse(offset, "offset expression"));
    };
    let factor = offset.get(..at).unwrap_or("");
    let addend = offset.get(at + 1..).unwrap_or("");

    if let (Ok(value), Ok(n), Ok(m)) = (
        raw.parse::<i64>(),
        factor.parse::<i64>(),
        addend.parse::<i64>(),
    ) {
        let result = if sign == '+' {
            value * n + m
        } else {
            value * n - m
        };
        return Ok(result.to_string());
    }

    let value = raw
        .parse::<f64>()
        .map_err(|_| CoerceError::parse(raw, "number"))?;
    let n = factor
        .parse::<f64>()
        .map_err(|_| CoerceError::parse(factor, "number"))?;
    let m = addend
        .parse::<f64>()
        .map_err(|_| CoerceError::parse(addend, "number"))?;
    let result = if sign == '+' {
        value * n + m
    } else {
        value * n - m
    };
    Ok(result.to_string())
}
