use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::consts::{ADDRESS_LEN, DEFAULT_POWER_REDUCTION};
use crate::error::ApiError;

/// Key prefixes inside the staking namespace.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
pub enum StakingPrefix {
    LastValidatorPower = 0x11,
    Validator = 0x21,
    ValidatorsByPower = 0x23,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize)]
pub enum ValidatorStatus {
    Unbonded = 1,
    Unbonding,
    Bonded,
}

impl Default for ValidatorStatus {
    fn default() -> Self {
        Self::Unbonded
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: Address,
    pub tokens: u128,
    #[serde(default)]
    pub jailed: bool,
    #[serde(default)]
    pub status: ValidatorStatus,
}

impl Validator {
    pub fn new(operator: Address, tokens: u128) -> Self {
        Self {
            operator,
            tokens,
            jailed: false,
            status: ValidatorStatus::Unbonded,
        }
    }

    pub fn consensus_power(&self) -> u64 {
        consensus_power(self.tokens)
    }
}

/// Voting power change handed to consensus. Zero power removes a validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub operator: Address,
    pub power: u64,
}

pub fn consensus_power(tokens: u128) -> u64 {
    u64::try_from(tokens / DEFAULT_POWER_REDUCTION).unwrap_or(u64::MAX)
}

pub fn validator_key(operator: &Address) -> Vec<u8> {
    prefixed(StakingPrefix::Validator, operator.as_bytes())
}

pub fn last_validator_power_key(operator: &Address) -> Vec<u8> {
    prefixed(StakingPrefix::LastValidatorPower, operator.as_bytes())
}

/// `prefix | power (u64 BE) | address length | inverted address`
///
/// Iterating the prefix in reverse yields validators by descending power,
/// ties broken by ascending address.
pub fn power_index_key(validator: &Validator) -> Vec<u8> {
    power_index_key_for(validator.consensus_power(), &validator.operator)
}

pub fn power_index_key_for(power: u64, operator: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + 1 + ADDRESS_LEN);
    key.push(StakingPrefix::ValidatorsByPower.into());
    key.extend_from_slice(&power.to_be_bytes());
    key.push(ADDRESS_LEN as u8);
    key.extend(operator.as_bytes().iter().map(|b| !b));
    key
}

/// Decodes the operator address out of a power index key.
pub fn parse_power_index_key(key: &[u8]) -> Result<(u64, Address), ApiError> {
    if key.len() < 10 || key[0] != u8::from(StakingPrefix::ValidatorsByPower) {
        return Err(ApiError::InvalidPowerIndexKey);
    }
    let mut power = [0u8; 8];
    power.copy_from_slice(&key[1..9]);

    let len = key[9] as usize;
    let inverted = &key[10..];
    if inverted.len() != len {
        return Err(ApiError::InvalidPowerIndexKey);
    }
    let bytes: Vec<u8> = inverted.iter().map(|b| !b).collect();
    let address = Address::from_slice(&bytes).map_err(|_| ApiError::InvalidPowerIndexKey)?;
    Ok((u64::from_be_bytes(power), address))
}

pub fn power_index_prefix() -> Vec<u8> {
    vec![StakingPrefix::ValidatorsByPower.into()]
}

fn prefixed(prefix: StakingPrefix, body: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + body.len());
    key.push(prefix.into());
    key.extend_from_slice(body);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; ADDRESS_LEN])
    }

    #[test]
    fn power_key_round_trip() {
        let validator = Validator::new(addr(0x0f), 42 * DEFAULT_POWER_REDUCTION + 7);
        let key = power_index_key(&validator);
        assert_eq!(key[0], 0x23);
        assert_eq!(key[9], ADDRESS_LEN as u8);
        assert_eq!(key[10], 0xf0);
        assert_eq!(parse_power_index_key(&key).unwrap(), (42, addr(0x0f)));
    }

    #[test]
    fn keys_sort_by_power() {
        let low = power_index_key_for(1, &addr(1));
        let high = power_index_key_for(2, &addr(1));
        assert!(low < high);

        // Equal power: the lower address sorts last, so it comes first in reverse.
        let a = power_index_key_for(5, &addr(1));
        let b = power_index_key_for(5, &addr(2));
        assert!(a > b);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(parse_power_index_key(&[0x23, 0, 0]).is_err());
        let mut key = power_index_key_for(1, &addr(1));
        key[0] = 0x21;
        assert!(parse_power_index_key(&key).is_err());
        let mut key = power_index_key_for(1, &addr(1));
        key.pop();
        assert!(parse_power_index_key(&key).is_err());
    }

    #[test]
    fn status_primitive() {
        assert_eq!(u8::from(ValidatorStatus::Bonded), 3);
        assert_eq!(ValidatorStatus::try_from(1u8).unwrap(), ValidatorStatus::Unbonded);
        assert!(ValidatorStatus::try_from(9u8).is_err());
        assert_eq!(consensus_power(u128::MAX), u64::MAX);
    }
}
