use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dec::Dec;
use crate::error::ApiError;

/// Integer amount of a single denomination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_str")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Result<Self, ApiError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self { denom, amount })
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = ApiError;

    /// Parses `"1000gnet"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ApiError::InvalidDenom(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        let amount = amount
            .parse::<u128>()
            .map_err(|_| ApiError::InvalidDecimal(s.to_string()))?;
        Coin::new(denom, amount)
    }
}

/// Decimal amount of a single denomination, used before truncation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: Dec) -> Result<Self, ApiError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self { denom, amount })
    }

    /// Converts to an integer coin, dropping the fractional part. Negative
    /// amounts truncate to zero.
    pub fn truncate(&self) -> Coin {
        let amount = self.amount.truncate_int().max(0) as u128;
        Coin {
            denom: self.denom.clone(),
            amount,
        }
    }
}

/// Denoms are 3 to 128 characters: a lowercase letter followed by
/// lowercase letters, digits or `/`.
pub fn validate_denom(denom: &str) -> Result<(), ApiError> {
    let bytes = denom.as_bytes();
    let valid = (3..=128).contains(&bytes.len())
        && bytes[0].is_ascii_lowercase()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'/');
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidDenom(denom.to_string()))
    }
}

mod amount_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denom_rules() {
        assert!(validate_denom("gnet").is_ok());
        assert!(validate_denom("ibc/abc123").is_ok());
        assert!(validate_denom("ab").is_err());
        assert!(validate_denom("Gnet").is_err());
        assert!(validate_denom("1net").is_err());
        assert!(validate_denom("gn-t").is_err());
    }

    #[test]
    fn parse_coin() {
        let coin: Coin = "1000gnet".parse().unwrap();
        assert_eq!(coin, Coin::new("gnet", 1000).unwrap());
        assert_eq!(coin.to_string(), "1000gnet");
        assert!("gnet".parse::<Coin>().is_err());
        assert!("1000".parse::<Coin>().is_err());
    }

    #[test]
    fn dec_coin_truncates() {
        let dec_coin = DecCoin::new("gnet", "1502473.6463".parse().unwrap()).unwrap();
        assert_eq!(dec_coin.truncate().amount, 1_502_473);

        let negative = DecCoin::new("gnet", "-3.2".parse().unwrap()).unwrap();
        assert!(negative.truncate().is_zero());
    }

    #[test]
    fn amount_serializes_as_string() {
        let coin = Coin::new("gnet", u128::MAX).unwrap();
        let json = serde_json::to_string(&coin).unwrap();
        assert!(json.contains(&format!("\"{}\"", u128::MAX)));
        let back: Coin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coin);
    }
}
