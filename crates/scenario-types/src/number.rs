//! Arbitrary-scale decimal numbers wide enough for on-chain amounts.
//!
//! A [`Number`] is `±mantissa × 10^exponent` with a 256-bit mantissa, so
//! uint256-sized literals such as `1e36` or `115792089237316195423570985008687907853269984665640564039457584007913129639935`
//! are exact. Values are kept normalized (no trailing zeros in the
//! mantissa, zero is unsigned), which makes derived equality numeric.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest accepted decimal exponent magnitude.
pub const MAX_EXPONENT: i16 = 255;

/// A number literal could not be represented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    /// The text is not written as a number.
    #[error("`{0}` is not a number")]
    Malformed(String),

    /// The text is a number, but its digits do not fit in 256 bits or its
    /// exponent exceeds the supported range.
    #[error("`{0}` is out of range")]
    OutOfRange(String),
}

/// An exact decimal number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Number {
    negative: bool,
    mantissa: U256,
    exponent: i16,
}

impl Number {
    /// Zero.
    pub const ZERO: Self = Self {
        negative: false,
        mantissa: U256::ZERO,
        exponent: 0,
    };

    /// Whether the number is below zero.
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether the number is zero.
    pub fn is_zero(&self) -> bool {
        self.mantissa == U256::ZERO
    }

    /// The unsigned significant digits.
    pub const fn mantissa(&self) -> U256 {
        self.mantissa
    }

    /// The power of ten the mantissa is scaled by.
    pub const fn exponent(&self) -> i16 {
        self.exponent
    }

    /// The number as a [`Decimal`], when it fits exactly.
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str_exact(&self.to_string()).ok()
    }

    /// The number as an unsigned 256-bit integer, when it is a non-negative
    /// integer that fits.
    pub fn to_u256(&self) -> Option<U256> {
        if self.negative || self.exponent < 0 {
            return None;
        }
        let mut value = self.mantissa;
        for _ in 0..self.exponent {
            value = value.checked_mul(U256::from(10_u8))?;
        }
        Some(value)
    }

    /// Build from a sign, a string of ASCII digits, and a power of ten.
    fn from_digits(
        negative: bool,
        digits: &str,
        exponent: i64,
        source: &str,
    ) -> Result<Self, NumberError> {
        let out_of_range = || NumberError::OutOfRange(source.to_owned());
        let significant = digits.trim_start_matches('0');
        let trimmed = significant.trim_end_matches('0');
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }

        let trailing = i64::try_from(significant.len().saturating_sub(trimmed.len()))
            .ok()
            .ok_or_else(out_of_range)?;
        let exponent = exponent.checked_add(trailing).ok_or_else(out_of_range)?;
        let exponent = i16::try_from(exponent)
            .ok()
            .filter(|exponent| exponent.unsigned_abs() <= MAX_EXPONENT.unsigned_abs())
            .ok_or_else(out_of_range)?;
        let mantissa = U256::from_str_radix(trimmed, 10)
            .ok()
            .ok_or_else(out_of_range)?;

        Ok(Self {
            negative,
            mantissa,
            exponent,
        })
    }
}

/// Parse the part after `e`/`E`. Well-formed but oversized exponents are
/// out of range rather than malformed.
fn parse_exponent(text: &str, source: &str) -> Result<i64, NumberError> {
    text.parse::<i64>().or_else(|_| {
        let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Err(NumberError::OutOfRange(source.to_owned()))
        } else {
            Err(NumberError::Malformed(source.to_owned()))
        }
    })
}

impl FromStr for Number {
    type Err = NumberError;

    /// Accepts `[+-]digits[.digits][(e|E)[+-]digits]`; at least one digit
    /// must appear before the exponent.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || NumberError::Malformed(text.to_owned());
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (significand, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((significand, exponent)) => (significand, parse_exponent(exponent, text)?),
            None => (unsigned, 0),
        };
        let (int, frac) = significand.split_once('.').unwrap_or((significand, ""));
        let all_digits = int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit());
        if (int.is_empty() && frac.is_empty()) || !all_digits {
            return Err(malformed());
        }

        let frac_len = i64::try_from(frac.len())
            .ok()
            .ok_or_else(|| NumberError::OutOfRange(text.to_owned()))?;
        let exponent = exponent
            .checked_sub(frac_len)
            .ok_or_else(|| NumberError::OutOfRange(text.to_owned()))?;
        let number = Self::from_digits(negative, &format!("{int}{frac}"), exponent, text)?;
        Ok(number)
    }
}

impl fmt::Display for Number {
    /// Plain decimal notation with no exponent and no trailing zeros after
    /// the point.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let digits = self.mantissa.to_string();
        let shift = usize::from(self.exponent.unsigned_abs());
        if self.exponent >= 0 {
            f.write_str(&digits)?;
            return f.write_str(&"0".repeat(shift));
        }
        match digits
            .len()
            .checked_sub(shift)
            .filter(|int_len| *int_len > 0)
            .and_then(|int_len| digits.split_at_checked(int_len))
        {
            Some((int, frac)) => write!(f, "{int}.{frac}"),
            None => write!(
                f,
                "0.{}{digits}",
                "0".repeat(shift.saturating_sub(digits.len()))
            ),
        }
    }
}

impl From<Decimal> for Number {
    fn from(decimal: Decimal) -> Self {
        let negative = decimal.is_sign_negative();
        let digits = decimal.mantissa().unsigned_abs().to_string();
        let scale = i64::from(decimal.scale());
        // A Decimal has at most 29 digits and scale 28, always in range.
        Self::from_digits(negative, &digits, 0_i64.saturating_sub(scale), &digits)
            .unwrap_or(Self::ZERO)
    }
}

impl From<U256> for Number {
    fn from(value: U256) -> Self {
        Self::from_digits(false, &value.to_string(), 0, "").unwrap_or(Self::ZERO)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Self::from(U256::from(value))
    }
}

impl TryFrom<String> for Number {
    type Error = NumberError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Number> for String {
    fn from(number: Number) -> Self {
        number.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn number(text: &str) -> Number {
        text.parse().unwrap()
    }

    #[test]
    fn parses_plain_and_scientific_forms() {
        assert_eq!(number("1.50").to_string(), "1.5");
        assert_eq!(number("+2.5e-3").to_string(), "0.0025");
        assert_eq!(number("-0.010").to_string(), "-0.01");
        assert_eq!(number("1e18").to_string(), "1000000000000000000");
        assert_eq!(number(".5").to_string(), "0.5");
        assert_eq!(number("7.").to_string(), "7");
    }

    #[test]
    fn equality_is_numeric() {
        assert_eq!(number("1.5"), number("15e-1"));
        assert_eq!(number("100"), number("1e2"));
        assert_eq!(number("-0"), Number::ZERO);
        assert_ne!(number("1"), number("-1"));
    }

    #[test]
    fn holds_uint256_sized_values() {
        assert_eq!(number("1e36").to_string(), format!("1{}", "0".repeat(36)));
        let expected: U256 = format!("1{}", "0".repeat(29)).parse().unwrap();
        assert_eq!(number("1e29").to_u256(), Some(expected));
        assert_eq!(number(&U256::MAX.to_string()).to_u256(), Some(U256::MAX));
        assert_eq!(number("1e-100").exponent(), -100);
        assert_eq!(number("1e-100"), number(&number("1e-100").to_string()));
    }

    #[test]
    fn out_of_range_is_distinct_from_malformed() {
        let too_wide = format!("{}0", U256::MAX);
        assert_eq!(
            format!("{too_wide}1").parse::<Number>(),
            Err(NumberError::OutOfRange(format!("{too_wide}1")))
        );
        assert!(matches!("1e300".parse::<Number>(), Err(NumberError::OutOfRange(_))));
        assert!(matches!(
            "1e99999999999999999999".parse::<Number>(),
            Err(NumberError::OutOfRange(_))
        ));
        for bad in ["", "-", "e5", "1e", "1.2.3", "0x10", "1_000", "abc"] {
            assert!(
                matches!(bad.parse::<Number>(), Err(NumberError::Malformed(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn trailing_zeros_do_not_count_against_width() {
        let text = format!("1{}", "0".repeat(120));
        assert_eq!(number(&text), number("1e120"));
    }

    #[test]
    fn converts_to_and_from_decimal() {
        assert_eq!(Number::from(dec!(1.50)), number("1.5"));
        assert_eq!(Number::from(dec!(-0.001)), number("-1e-3"));
        assert_eq!(number("0.01").to_decimal(), Some(dec!(0.01)));
        assert_eq!(number("1e36").to_decimal(), None);
    }

    #[test]
    fn serializes_as_canonical_string() {
        let json = serde_json::to_value(number("2.50")).unwrap();
        assert_eq!(json, serde_json::json!("2.5"));
        let back: Number = serde_json::from_value(json).unwrap();
        assert_eq!(back, number("2.5"));
        assert!(serde_json::from_str::<Number>("\"1e999\"").is_err());
    }
}
