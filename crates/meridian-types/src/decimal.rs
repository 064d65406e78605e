//! Fixed-point helpers.
//!
//! All prices and ratios are [`Decimal`]s: a 96-bit integer mantissa with a
//! base-10 scale of at most 28. Every operation is integer arithmetic, so
//! results are bit-identical on every node. Overflow is reported, never
//! wrapped. Conversions back to token units truncate toward zero.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Errors from fixed-point conversions and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("invalid decimal string '{0}'")]
    Parse(String),

    #[error("decimal arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("negative value {0} cannot be converted to a token amount")]
    Negative(Decimal),
}

pub type Result<T> = std::result::Result<T, DecimalError>;

/// Parse a decimal string such as `"0.9"`.
pub fn parse(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim()).map_err(|_| DecimalError::Parse(s.to_string()))
}

/// Lift an integer token amount into a decimal.
pub fn from_amount(amount: u128) -> Result<Decimal> {
    Decimal::from_u128(amount).ok_or(DecimalError::Overflow)
}

/// Convert a decimal to token units, truncating toward zero.
pub fn to_amount(value: Decimal) -> Result<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DecimalError::Negative(value));
    }
    value.trunc().to_u128().ok_or(DecimalError::Overflow)
}

pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or(DecimalError::Overflow)
}

pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b).ok_or(DecimalError::Overflow)
}

pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or(DecimalError::Overflow)
}

pub fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal> {
    if b.is_zero() {
        return Err(DecimalError::DivisionByZero);
    }
    a.checked_div(b).ok_or(DecimalError::Overflow)
}

/// `trunc(amount * ratio)` in token units.
pub fn mul_amount(amount: u128, ratio: Decimal) -> Result<u128> {
    to_amount(checked_mul(from_amount(amount)?, ratio)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(parse("0.9").expect("parse"), Decimal::new(9, 1));
        assert_eq!(parse(" 10 ").expect("parse"), Decimal::from(10));
        assert!(matches!(parse("abc"), Err(DecimalError::Parse(_))));
    }

    #[test]
    fn test_to_amount_truncates() {
        assert_eq!(to_amount(parse("1.999").expect("parse")).expect("amount"), 1);
        assert_eq!(to_amount(Decimal::ZERO).expect("amount"), 0);
    }

    #[test]
    fn test_to_amount_rejects_negative() {
        let err = to_amount(parse("-1").expect("parse")).expect_err("negative");
        assert!(matches!(err, DecimalError::Negative(_)));
    }

    #[test]
    fn test_mul_amount() {
        // 1_800 * 0.5 = 900
        assert_eq!(mul_amount(1_800, parse("0.5").expect("parse")).expect("mul"), 900);
        // 9 * 0.5 = 4.5 -> 4
        assert_eq!(mul_amount(9, parse("0.5").expect("parse")).expect("mul"), 4);
    }

    #[test]
    fn test_div_by_zero() {
        let err = checked_div(Decimal::ONE, Decimal::ZERO).expect_err("div zero");
        assert_eq!(err, DecimalError::DivisionByZero);
    }

    #[test]
    fn test_from_amount_overflow() {
        assert_eq!(from_amount(u128::MAX), Err(DecimalError::Overflow));
    }
}
