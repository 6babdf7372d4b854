//! Exact numeric values.
//!
//! Values are big rationals so that sums like `0.1 + 0.2` stay exact and
//! fractions can be shown in reduced form.

use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use regex::Regex;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use super::base::Base;
use crate::error::CalcError;

lazy_static! {
    /// Decimal literal with optional sign, fraction and exponent.
    static ref DECIMAL_LITERAL: Regex =
        Regex::new(r"^([+-])?([0-9]*)(?:\.([0-9]*))?(?:[eE]([+-]?[0-9]+))?$").unwrap();
}

/// Largest exponent accepted when parsing `1e<exp>` style literals.
const MAX_EXPONENT: i64 = 400;

/// An exact decimal quantity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NumericValue(BigRational);

pub(crate) fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10), exp as usize)
}

impl NumericValue {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn from_integer(i: BigInt) -> Self {
        Self(BigRational::from_integer(i))
    }

    pub fn from_ratio(r: BigRational) -> Self {
        Self(r)
    }

    /// `i64::MAX`, the default upper bound.
    pub fn max_i64() -> Self {
        Self::from(i64::MAX)
    }

    /// `-i64::MAX`, the default lower bound (symmetric with the upper one).
    pub fn min_i64() -> Self {
        Self::from(-i64::MAX)
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Integer part, truncated toward zero.
    pub fn trunc(&self) -> BigInt {
        self.0.trunc().to_integer()
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// Check if the magnitude exceeds `i64::MAX`.
    pub fn exceeds_i64(&self) -> bool {
        self.abs() > Self::max_i64()
    }

    pub fn checked_div(&self, rhs: &Self) -> Result<Self, CalcError> {
        if rhs.is_zero() {
            return Err(CalcError::DivisionByZero);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    /// Truncated remainder: the result carries the sign of the dividend.
    pub fn checked_rem(&self, rhs: &Self) -> Result<Self, CalcError> {
        if rhs.is_zero() {
            return Err(CalcError::DivisionByZero);
        }
        let quotient = (&self.0 / &rhs.0).trunc();
        Ok(Self(&self.0 - &rhs.0 * quotient))
    }

    /// Divide by 100.
    pub fn percent(&self) -> Self {
        Self(&self.0 / BigRational::from_integer(BigInt::from(100)))
    }

    /// Integer shift; `left` shifts toward larger magnitudes.
    pub fn shift(&self, amount: &Self, left: bool) -> Result<Self, CalcError> {
        if !self.is_integer() || !amount.is_integer() {
            return Err(CalcError::invalid_operation("shift requires integer operands"));
        }
        if amount.is_negative() {
            return Err(CalcError::invalid_operation("negative shift amount"));
        }
        let value = self.0.to_integer();
        if value.is_zero() {
            return Ok(Self::zero());
        }
        // anything past 64 bits is out of range anyway
        let bits = match amount.0.to_integer().to_usize() {
            Some(b) if b <= 64 => b,
            _ if left => return Err(CalcError::Overflow),
            _ => 64,
        };
        let shifted = if left { value << bits } else { value >> bits };
        Ok(Self::from_integer(shifted))
    }

    /// Parse an integer literal written in `base`. Hex letters may be any case.
    pub fn parse_radix(text: &str, base: Base) -> Option<Self> {
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if digits.is_empty() || !digits.chars().all(|c| base.is_digit(c)) {
            return None;
        }
        let magnitude = BigInt::parse_bytes(digits.as_bytes(), base.radix())?;
        let value = if negative { -magnitude } else { magnitude };
        Some(Self::from_integer(value))
    }

    /// Render the integer part in `base`, uppercase, with a leading `-` if negative.
    pub fn to_radix_string(&self, base: Base) -> String {
        self.trunc().to_str_radix(base.radix()).to_uppercase()
    }
}

impl Default for NumericValue {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for NumericValue {
    fn from(i: i64) -> Self {
        Self::from_integer(BigInt::from(i))
    }
}

impl FromStr for NumericValue {
    type Err = CalcError;

    /// Parse a decimal literal (`-1,234.5`, `.5`, `1.5e+21`) or a fraction (`1/3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();

        if let Some((numer, denom)) = cleaned.split_once('/') {
            let numer: NumericValue = numer.parse()?;
            let denom: NumericValue = denom.parse()?;
            return numer.checked_div(&denom);
        }

        let caps = DECIMAL_LITERAL
            .captures(&cleaned)
            .ok_or_else(|| CalcError::invalid_expression(format!("'{s}' is not a number")))?;
        let int_part = caps.get(2).map_or("", |m| m.as_str());
        let frac_part = caps.get(3).map_or("", |m| m.as_str());
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(CalcError::invalid_expression(format!("'{s}' is not a number")));
        }

        let digits = format!("{int_part}{frac_part}");
        let mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).unwrap_or_default();
        let mut exponent = -(frac_part.len() as i64);
        if let Some(exp) = caps.get(4) {
            let exp: i64 = exp
                .as_str()
                .parse()
                .map_err(|_| CalcError::invalid_expression(format!("bad exponent in '{s}'")))?;
            if exp.abs() > MAX_EXPONENT {
                return Err(CalcError::Overflow);
            }
            exponent += exp;
        }

        let scale = pow10(exponent.unsigned_abs() as u32);
        let mut value = if exponent >= 0 {
            BigRational::from_integer(mantissa * scale)
        } else {
            BigRational::new(mantissa, scale)
        };
        if caps.get(1).is_some_and(|m| m.as_str() == "-") {
            value = -value;
        }
        Ok(Self(value))
    }
}

impl fmt::Display for NumericValue {
    /// Exact form: an integer, or a reduced `numerator/denominator`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.denom().is_one() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl Add for NumericValue {
    type Output = NumericValue;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for NumericValue {
    type Output = NumericValue;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for NumericValue {
    type Output = NumericValue;
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for NumericValue {
    type Output = NumericValue;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> NumericValue {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(num("42"), NumericValue::from(42));
        assert_eq!(num("-1,234"), NumericValue::from(-1234));
        assert_eq!(num(".5") + num(".5"), NumericValue::from(1));
        assert_eq!(num("0.1") + num("0.2"), num("0.3"));
        assert_eq!(num("1.5e+3"), NumericValue::from(1500));
        assert_eq!(num("25e-2"), num("0.25"));
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(num("1/3").to_string(), "1/3");
        assert_eq!(num("4/2"), NumericValue::from(2));
        assert_eq!("1/0".parse::<NumericValue>(), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<NumericValue>().is_err());
        assert!(".".parse::<NumericValue>().is_err());
        assert!("1.2.3".parse::<NumericValue>().is_err());
        assert!("abc".parse::<NumericValue>().is_err());
    }

    #[test]
    fn test_remainder_sign_follows_dividend() {
        assert_eq!(num("7").checked_rem(&num("3")), Ok(num("1")));
        assert_eq!(num("-7").checked_rem(&num("3")), Ok(num("-1")));
        assert_eq!(num("5.5").checked_rem(&num("2")), Ok(num("1.5")));
        assert_eq!(num("1").checked_rem(&num("0")), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn test_shift() {
        assert_eq!(num("1").shift(&num("4"), true), Ok(num("16")));
        assert_eq!(num("256").shift(&num("4"), false), Ok(num("16")));
        assert_eq!(num("1").shift(&num("100"), true), Err(CalcError::Overflow));
        assert_eq!(num("1").shift(&num("100"), false), Ok(num("0")));
        assert!(num("1.5").shift(&num("1"), true).is_err());
    }

    #[test]
    fn test_radix() {
        assert_eq!(NumericValue::parse_radix("ff", Base::Hex), Some(num("255")));
        assert_eq!(NumericValue::parse_radix("-101", Base::Bin), Some(num("-5")));
        assert_eq!(NumericValue::parse_radix("19", Base::Oct), None);
        assert_eq!(num("255").to_radix_string(Base::Hex), "FF");
        assert_eq!(num("-8").to_radix_string(Base::Oct), "-10");
    }

    #[test]
    fn test_bounds() {
        assert!(!NumericValue::max_i64().exceeds_i64());
        assert!((NumericValue::max_i64() + num("1")).exceeds_i64());
        assert!(!NumericValue::min_i64().exceeds_i64());
    }
}
