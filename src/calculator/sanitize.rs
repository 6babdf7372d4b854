//! Expression sanitizing.
//!
//! Normalizes typed text into the form the evaluator accepts: display glyphs
//! become ASCII operators, characters outside the whitelist are dropped,
//! whitespace is collapsed and a dangling trailing operator is removed.

use lazy_static::lazy_static;
use regex::Regex;

use super::base::{Base, Mode};

lazy_static! {
    /// Runs of whitespace.
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    /// A binary operator (with surrounding spaces) at the end of the text.
    static ref TRAILING_OPERATOR: Regex = Regex::new(r"\s*(?:<<|>>|[+\-*/%])\s*$").unwrap();
}

/// Operator glyphs shown on buttons and their evaluator equivalents.
const GLYPHS: &[(char, char)] = &[('×', '*'), ('÷', '/'), ('−', '-')];

/// Sanitize `raw` for evaluation in `base` under `mode`, keeping at most
/// `max_length` characters.
pub fn sanitize(raw: &str, base: Base, mode: Mode, max_length: usize) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            GLYPHS
                .iter()
                .find(|(glyph, _)| *glyph == c)
                .map_or(c, |(_, ascii)| *ascii)
        })
        .collect();

    let filtered = filter_allowed(&replaced, base, mode);
    let collapsed = WHITESPACE.replace_all(&filtered, " ");

    let mut result = strip_trailing_operators(collapsed.trim());
    if result.chars().count() > max_length {
        result = result.chars().take(max_length).collect();
        result = strip_trailing_operators(&result);
    }
    result
}

/// Check if `c` may appear in an expression at all (before shift pairing).
fn is_allowed(c: char, base: Base, mode: Mode) -> bool {
    c.is_ascii_digit()
        || c.is_whitespace()
        || "+-*/.()%".contains(c)
        || (base == Base::Hex && c.is_ascii_hexdigit())
        || (mode.is_programmer() && (c == '<' || c == '>'))
}

fn filter_allowed(text: &str, base: Base, mode: Mode) -> String {
    let chars: Vec<char> = text
        .chars()
        .filter(|c| is_allowed(*c, base, mode))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    // lone '<' or '>' is not an operator; only doubled ones survive
    let mut result = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '<' || c == '>' {
            if chars.get(i + 1) == Some(&c) {
                result.push(c);
                result.push(c);
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        result.push(c);
        i += 1;
    }
    result
}

fn strip_trailing_operators(text: &str) -> String {
    let mut current = text.trim_end().to_string();
    while let Some(m) = TRAILING_OPERATOR.find(&current) {
        current.truncate(m.start());
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn std_sanitize(raw: &str) -> String {
        sanitize(raw, Base::Dec, Mode::Standard, 50)
    }

    #[test]
    fn test_glyph_replacement() {
        assert_eq!(std_sanitize("6 × 7"), "6 * 7");
        assert_eq!(std_sanitize("8 ÷ 2"), "8 / 2");
        assert_eq!(std_sanitize("8 − 2"), "8 - 2");
    }

    #[test]
    fn test_disallowed_characters_removed() {
        assert_eq!(std_sanitize("2 + abc3"), "2 + 3");
        assert_eq!(std_sanitize("1,000 + 1"), "1000 + 1");
        assert_eq!(std_sanitize("2 << 1"), "2 1");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(std_sanitize("  1   +\t2  "), "1 + 2");
    }

    #[test]
    fn test_trailing_operator_stripped() {
        assert_eq!(std_sanitize("3+"), "3");
        assert_eq!(std_sanitize("3 + "), "3");
        assert_eq!(std_sanitize("3 × - "), "3");
        assert_eq!(std_sanitize("-"), "");
        assert_eq!(std_sanitize("(1 + 2)"), "(1 + 2)");
    }

    #[test]
    fn test_hex_letters() {
        assert_eq!(sanitize("ff + 1", Base::Hex, Mode::Programmer, 64), "FF + 1");
        assert_eq!(sanitize("ff + 1", Base::Dec, Mode::Programmer, 64), "+ 1");
    }

    #[test]
    fn test_shift_operators() {
        assert_eq!(sanitize("1 << 4", Base::Dec, Mode::Programmer, 64), "1 << 4");
        assert_eq!(sanitize("1 < 4", Base::Dec, Mode::Programmer, 64), "1 4");
        assert_eq!(sanitize("16 >>", Base::Dec, Mode::Programmer, 64), "16");
    }

    #[test]
    fn test_truncation() {
        assert_eq!(sanitize("123456", Base::Dec, Mode::Standard, 4), "1234");
        assert_eq!(sanitize("12 + 34", Base::Dec, Mode::Standard, 4), "12");
    }
}
