use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::consts::{DEC_ONE_RAW, DEC_PRECISION};
use crate::error::ApiError;

/// Signed fixed-point decimal carrying 18 fractional digits.
///
/// Multiplication and division round half to even at the last digit; the
/// only truncation happens in [`Dec::truncate_int`], when a decimal becomes
/// a coin amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(i128);

impl Dec {
    pub const ZERO: Dec = Dec(0);
    pub const ONE: Dec = Dec(DEC_ONE_RAW);

    pub const fn from_raw(raw: i128) -> Self {
        Dec(raw)
    }

    pub const fn raw(&self) -> i128 {
        self.0
    }

    pub fn from_int(value: i128) -> Result<Self, ApiError> {
        value
            .checked_mul(DEC_ONE_RAW)
            .map(Dec)
            .ok_or(ApiError::DecimalOverflow)
    }

    pub fn from_u128(value: u128) -> Result<Self, ApiError> {
        let value = i128::try_from(value).map_err(|_| ApiError::DecimalOverflow)?;
        Self::from_int(value)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Dec) -> Result<Dec, ApiError> {
        self.0
            .checked_add(other.0)
            .map(Dec)
            .ok_or(ApiError::DecimalOverflow)
    }

    pub fn checked_sub(self, other: Dec) -> Result<Dec, ApiError> {
        self.0
            .checked_sub(other.0)
            .map(Dec)
            .ok_or(ApiError::DecimalOverflow)
    }

    pub fn checked_mul(self, other: Dec) -> Result<Dec, ApiError> {
        let negative = (self.0 < 0) != (other.0 < 0);
        let one = DEC_ONE_RAW as u128;
        let a = self.0.unsigned_abs();
        let b = other.0.unsigned_abs();

        // a * b / one, split so no intermediate exceeds 128 bits:
        // a * b = one * (a_hi * b + a_lo * b_hi) + a_lo * b_lo
        let (a_hi, a_lo) = (a / one, a % one);
        let (b_hi, b_lo) = (b / one, b % one);
        let low = a_lo * b_lo;

        let quotient = a_hi
            .checked_mul(b)
            .and_then(|q| q.checked_add(a_lo.checked_mul(b_hi)?))
            .and_then(|q| q.checked_add(low / one))
            .ok_or(ApiError::DecimalOverflow)?;

        let rounded = round_half_even(quotient, low % one, one)?;
        to_signed(rounded, negative)
    }

    /// Divides by an integer, e.g. a period provision by its epoch count.
    pub fn checked_quo_int(self, divisor: i128) -> Result<Dec, ApiError> {
        if divisor == 0 {
            return Err(ApiError::DivisionByZero);
        }
        let negative = (self.0 < 0) != (divisor < 0);
        let a = self.0.unsigned_abs();
        let d = divisor.unsigned_abs();
        let rounded = round_half_even(a / d, a % d, d)?;
        to_signed(rounded, negative)
    }

    /// Drops the fractional digits, rounding toward zero.
    pub fn truncate_int(&self) -> i128 {
        self.0 / DEC_ONE_RAW
    }
}

fn round_half_even(quotient: u128, remainder: u128, divisor: u128) -> Result<u128, ApiError> {
    let round_up = match remainder.cmp(&(divisor - remainder)) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => quotient % 2 == 1,
    };
    if round_up {
        quotient.checked_add(1).ok_or(ApiError::DecimalOverflow)
    } else {
        Ok(quotient)
    }
}

fn to_signed(magnitude: u128, negative: bool) -> Result<Dec, ApiError> {
    let value = i128::try_from(magnitude).map_err(|_| ApiError::DecimalOverflow)?;
    Ok(Dec(if negative { -value } else { value }))
}

impl FromStr for Dec {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::InvalidDecimal(s.to_string());
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (body, None),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut frac_raw: u128 = 0;
        if let Some(frac) = frac_part {
            if frac.is_empty()
                || frac.len() > DEC_PRECISION as usize
                || !frac.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }
            let padding = DEC_PRECISION - frac.len() as u32;
            frac_raw = frac.parse::<u128>().map_err(|_| invalid())? * 10u128.pow(padding);
        }

        let int_raw = int_part
            .parse::<u128>()
            .map_err(|_| invalid())?
            .checked_mul(DEC_ONE_RAW as u128)
            .and_then(|raw| raw.checked_add(frac_raw))
            .ok_or(ApiError::DecimalOverflow)?;

        to_signed(int_raw, negative)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let one = DEC_ONE_RAW as u128;
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0width$}",
            magnitude / one,
            magnitude % one,
            width = DEC_PRECISION as usize
        )
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(dec("0.7").raw(), 700_000_000_000_000_000);
        assert_eq!(dec("1").to_string(), "1.000000000000000000");
        assert_eq!(dec("-1.5").to_string(), "-1.500000000000000000");
        assert_eq!(dec("548402880.90").to_string(), "548402880.900000000000000000");
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", " ", "abc", "1.", ".5", "1.2.3", "1.0000000000000000001", "--1"] {
            assert!(bad.parse::<Dec>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn mul_is_exact_for_share_of_integer() {
        let amount = Dec::from_int(1000).unwrap();
        let product = amount.checked_mul(dec("0.7")).unwrap();
        assert_eq!(product, Dec::from_int(700).unwrap());
        assert_eq!(product.truncate_int(), 700);
    }

    #[test]
    fn mul_rounds_half_to_even() {
        let half = dec("0.5");
        assert_eq!(dec("0.000000000000000001").checked_mul(half).unwrap(), Dec::ZERO);
        assert_eq!(
            dec("0.000000000000000003").checked_mul(half).unwrap(),
            dec("0.000000000000000002")
        );
    }

    #[test]
    fn mul_handles_large_operands() {
        let big = dec("548402880.9");
        let product = big.checked_mul(Dec::from_int(1_000_000).unwrap()).unwrap();
        assert_eq!(product, dec("548402880900000"));
    }

    #[test]
    fn quo_int_rounds() {
        assert_eq!(Dec::ONE.checked_quo_int(3).unwrap().to_string(), "0.333333333333333333");
        assert_eq!(
            Dec::from_int(2).unwrap().checked_quo_int(3).unwrap().to_string(),
            "0.666666666666666667"
        );
        assert_eq!(Dec::ONE.checked_quo_int(0), Err(ApiError::DivisionByZero));
    }

    #[test]
    fn truncate_rounds_toward_zero() {
        assert_eq!(dec("1502473.99").truncate_int(), 1_502_473);
        assert_eq!(dec("-2.5").truncate_int(), -2);
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(Dec::from_int(i128::MAX), Err(ApiError::DecimalOverflow));
        let huge = Dec::from_raw(i128::MAX);
        assert_eq!(huge.checked_mul(Dec::from_int(2).unwrap()), Err(ApiError::DecimalOverflow));
    }

    #[test]
    fn serde_uses_strings() {
        let json = serde_json::to_string(&dec("0.25")).unwrap();
        assert_eq!(json, "\"0.250000000000000000\"");
        let back: Dec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dec("0.25"));
    }
}
