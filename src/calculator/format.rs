//! Result formatting.
//!
//! Standard mode renders fractions, fixed-point or exponential decimals.
//! Programmer mode renders the integer part in the active base with the
//! base's digit grouping.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use super::base::{Base, Mode};
use super::convert::OVERFLOW;
use super::number::{NumericValue, pow10};

/// Largest denominator shown as a fraction.
const MAX_FRACTION_DENOMINATOR: u32 = 10_000;
/// Magnitudes at or above `10^21` switch to exponential notation.
const LARGE_EXPONENT: i64 = 21;
/// Non-zero magnitudes below `10^-7` switch to exponential notation.
const SMALL_EXPONENT: i64 = -7;

/// Formatting knobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub base: Base,
    pub mode: Mode,
    /// Digits after the decimal point (also for the exponential mantissa).
    pub precision: u32,
    pub use_fractions: bool,
    pub use_thousands_separator: bool,
    /// Magnitudes above this render as `Overflow`; `None` disables the check.
    pub overflow_bound: Option<NumericValue>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            base: Base::Dec,
            mode: Mode::Standard,
            precision: 10,
            use_fractions: false,
            use_thousands_separator: false,
            overflow_bound: Some(NumericValue::max_i64()),
        }
    }
}

/// Render `value` for display.
pub fn format_value(value: &NumericValue, options: &FormatOptions) -> String {
    if let Some(bound) = &options.overflow_bound {
        if value.abs() > *bound {
            return OVERFLOW.to_string();
        }
    }

    if options.mode.is_programmer() {
        return format_programmer(value, options.base, options.use_thousands_separator);
    }

    let fraction = options
        .use_fractions
        .then(|| format_fraction(value))
        .flatten();
    let formatted = match fraction {
        Some(fraction) => fraction,
        None if needs_exponent(value) => format_exponential(value, options.precision),
        None => format_fixed(value, options.precision),
    };

    if options.use_thousands_separator {
        group_integer_part(&formatted)
    } else {
        formatted
    }
}

/// Render `value` in a form the editor can keep typing after: no grouping,
/// no fraction and no exponent.
pub fn format_editable(value: &NumericValue, options: &FormatOptions) -> String {
    if options.mode.is_programmer() {
        value.to_radix_string(options.base)
    } else {
        format_fixed(value, options.precision)
    }
}

fn format_fraction(value: &NumericValue) -> Option<String> {
    if value.is_integer() {
        return Some(value.numer().to_string());
    }
    if *value.denom() <= BigInt::from(MAX_FRACTION_DENOMINATOR) {
        return Some(format!("{}/{}", value.numer(), value.denom()));
    }
    None
}

fn needs_exponent(value: &NumericValue) -> bool {
    if value.is_zero() {
        return false;
    }
    let exponent = decimal_exponent(value.as_ratio());
    exponent >= LARGE_EXPONENT || exponent < SMALL_EXPONENT
}

fn pow10_ratio(exp: i64) -> BigRational {
    let scale = pow10(exp.unsigned_abs() as u32);
    if exp >= 0 {
        BigRational::from_integer(scale)
    } else {
        BigRational::new(BigInt::from(1), scale)
    }
}

/// The `e` with `10^e <= |r| < 10^(e+1)`, for non-zero `r`.
fn decimal_exponent(r: &BigRational) -> i64 {
    let abs = r.abs();
    let numer_digits = abs.numer().to_string().len() as i64;
    let denom_digits = abs.denom().to_string().len() as i64;
    let mut exponent = numer_digits - denom_digits;
    if abs < pow10_ratio(exponent) {
        exponent -= 1;
    }
    exponent
}

/// Split a non-negative scaled integer into integer and trimmed fraction digits.
fn split_scaled(scaled: &BigInt, precision: u32) -> (String, String) {
    let precision = precision as usize;
    let mut digits = scaled.to_string();
    if digits.len() <= precision {
        digits = format!("{}{}", "0".repeat(precision + 1 - digits.len()), digits);
    }
    let (int_part, frac_part) = digits.split_at(digits.len() - precision);
    (int_part.to_string(), frac_part.trim_end_matches('0').to_string())
}

/// Fixed-point with at most `precision` decimals, trailing zeros trimmed.
fn format_fixed(value: &NumericValue, precision: u32) -> String {
    let scale = BigRational::from_integer(pow10(precision));
    let scaled = (value.as_ratio() * scale).round().to_integer();
    if scaled.is_zero() {
        return "0".to_string();
    }

    let sign = if scaled.is_negative() { "-" } else { "" };
    let (int_part, frac_part) = split_scaled(&scaled.abs(), precision);
    if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

fn format_exponential(value: &NumericValue, precision: u32) -> String {
    let abs = value.as_ratio().abs();
    let mut exponent = decimal_exponent(&abs);
    let mantissa = &abs / pow10_ratio(exponent);
    let mut scaled = (mantissa * BigRational::from_integer(pow10(precision)))
        .round()
        .to_integer();
    // 9.99.. may round up to 10
    if scaled >= pow10(precision + 1) {
        scaled /= BigInt::from(10);
        exponent += 1;
    }

    let (int_part, frac_part) = split_scaled(&scaled, precision);
    let sign = if value.is_negative() { "-" } else { "" };
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    let mantissa = if frac_part.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac_part}")
    };
    format!("{sign}{mantissa}e{exp_sign}{}", exponent.abs())
}

/// Group `digits` from the right into runs of `width`.
fn group_digits(digits: &str, width: usize, separator: char, pad: bool) -> String {
    let mut digits = digits.to_string();
    if pad && digits.len() % width != 0 {
        let padding = width - digits.len() % width;
        digits = format!("{}{}", "0".repeat(padding), digits);
    }

    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % width == 0 {
            result.push(separator);
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Apply thousands separators to the integer part (or numerator) of a
/// formatted decimal or fraction.
fn group_integer_part(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let split = unsigned.find(['.', 'e', '/']).unwrap_or(unsigned.len());
    let (int_part, rest) = unsigned.split_at(split);
    format!("{sign}{}{rest}", group_digits(int_part, 3, ',', false))
}

fn format_programmer(value: &NumericValue, base: Base, grouped: bool) -> String {
    let magnitude = value.trunc().abs();
    let digits = magnitude.to_str_radix(base.radix()).to_uppercase();
    let sign = if magnitude.is_zero() || !value.is_negative() { "" } else { "-" };
    if !grouped {
        return format!("{sign}{digits}");
    }
    let spec = base.spec();
    let grouped = group_digits(&digits, spec.group_width, spec.group_separator, spec.pad_groups);
    format!("{sign}{grouped}")
}
