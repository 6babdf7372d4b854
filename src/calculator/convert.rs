//! Base conversion of expressions and standalone values.

use super::base::Base;
use super::number::NumericValue;
use crate::error::{CalcError, Result};

/// Text rendered for values beyond the signed 64-bit range.
pub const OVERFLOW: &str = "Overflow";

/// Convert every numeric literal in `expression` from `from` to `to`.
///
/// Operators, parentheses and whitespace are copied verbatim. Any literal that
/// is not a valid `from` number fails the whole conversion.
pub fn convert(expression: &str, from: Base, to: Base) -> Result<String> {
    let mut output = String::with_capacity(expression.len());
    let mut literal = String::new();

    for c in expression.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            literal.push(c);
            continue;
        }
        if !literal.is_empty() {
            output.push_str(&convert_literal(&literal, from, to)?);
            literal.clear();
        }
        output.push(c);
    }
    if !literal.is_empty() {
        output.push_str(&convert_literal(&literal, from, to)?);
    }

    Ok(output)
}

fn convert_literal(literal: &str, from: Base, to: Base) -> Result<String> {
    if literal.contains('.') {
        // only decimal literals may carry a fraction, and they cannot change base
        if from.is_decimal() && to.is_decimal() && literal.parse::<NumericValue>().is_ok() {
            return Ok(literal.to_string());
        }
        return Err(CalcError::invalid_expression(format!(
            "'{literal}' cannot be converted to {to}"
        )));
    }

    let value = NumericValue::parse_radix(literal, from).ok_or_else(|| {
        CalcError::invalid_expression(format!("'{literal}' is not a valid {from} number"))
    })?;
    Ok(value.to_radix_string(to))
}

/// Convert a single value between bases.
///
/// Returns `"0"` for empty or invalid input and [`OVERFLOW`] when the
/// magnitude exceeds `i64::MAX`. A base prefix such as `0x` is accepted.
pub fn convert_between_bases(value: &str, from: Base, to: Base) -> String {
    let trimmed = value.trim();
    let (negative, magnitude) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let prefix = from.spec().prefix;
    let digits = match magnitude.get(..prefix.len()) {
        Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(prefix) => {
            &magnitude[prefix.len()..]
        }
        _ => magnitude,
    };

    let Some(parsed) = NumericValue::parse_radix(digits, from) else {
        return "0".to_string();
    };
    if parsed.exceeds_i64() {
        return OVERFLOW.to_string();
    }
    let parsed = if negative { -parsed } else { parsed };
    parsed.to_radix_string(to)
}
