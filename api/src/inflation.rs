use serde::{Deserialize, Serialize};

use crate::coin::{validate_denom, Coin, DecCoin};
use crate::consts::*;
use crate::dec::Dec;
use crate::epoch::validate_epoch_identifier;
use crate::error::ApiError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationParams {
    pub mint_denom: String,
    pub enable_inflation: bool,
}

impl Default for InflationParams {
    fn default() -> Self {
        Self {
            mint_denom: DEFAULT_DENOM.to_string(),
            enable_inflation: true,
        }
    }
}

impl InflationParams {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_denom(&self.mint_denom)
    }
}

/// A named recipient of a fraction of every mint. The address is kept as
/// configured so that a bad entry fails its own transfer, not the genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationShare {
    pub name: String,
    pub address: String,
    pub share: Dec,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationDistribution {
    /// Routed to the fee collector for bonded validators.
    pub validators_share: Dec,
    #[serde(default)]
    pub other_shares: Vec<InflationShare>,
}

impl Default for InflationDistribution {
    fn default() -> Self {
        Self {
            validators_share: Dec::ONE,
            other_shares: Vec::new(),
        }
    }
}

impl InflationDistribution {
    /// Every share lies in [0, 1] and together they do not exceed 1.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut total = Dec::ZERO;
        let shares = std::iter::once(("validators", &self.validators_share))
            .chain(self.other_shares.iter().map(|s| (s.name.as_str(), &s.share)));

        for (name, share) in shares {
            if name.trim().is_empty() || share.is_negative() || *share > Dec::ONE {
                return Err(ApiError::InvalidShare {
                    name: name.to_string(),
                    share: share.to_string(),
                });
            }
            total = total.checked_add(*share)?;
        }

        if total > Dec::ONE {
            return Err(ApiError::InvalidShare {
                name: "total".to_string(),
                share: total.to_string(),
            });
        }
        Ok(())
    }
}

/// The default decay schedule in the default denom.
pub fn default_period_mint_provisions() -> Vec<DecCoin> {
    DEFAULT_PERIOD_MINT_PROVISIONS_CENTS
        .iter()
        .map(|cents| DecCoin {
            denom: DEFAULT_DENOM.to_string(),
            amount: Dec::from_raw(*cents as i128 * (DEC_ONE_RAW / 100)),
        })
        .collect()
}

/// Amount to mint at each epoch of `period`. Zero once the schedule is
/// exhausted or when a period has no epochs.
pub fn calculate_epoch_mint_provision(
    period_mint_provisions: &[DecCoin],
    period: u64,
    epochs_per_period: u64,
) -> Result<Dec, ApiError> {
    let Some(provision) = usize::try_from(period)
        .ok()
        .and_then(|index| period_mint_provisions.get(index))
    else {
        return Ok(Dec::ZERO);
    };
    if epochs_per_period == 0 {
        return Ok(Dec::ZERO);
    }
    provision.amount.checked_quo_int(epochs_per_period as i128)
}

/// `floor(coin.amount * share)` in the coin's denom.
pub fn get_proportion(coin: &Coin, share: Dec) -> Result<Coin, ApiError> {
    let amount = Dec::from_u128(coin.amount)?.checked_mul(share)?;
    Ok(Coin {
        denom: coin.denom.clone(),
        amount: amount.truncate_int().max(0) as u128,
    })
}

/// Whether the epoch count has run a full period past the current period's
/// start. Every epoch counts, including ones where nothing was minted.
pub fn period_should_advance(epoch_number: u64, period: u64, epochs_per_period: u64) -> bool {
    if epochs_per_period == 0 {
        return false;
    }
    let period_start = epochs_per_period as u128 * period as u128;
    epoch_number as u128 >= period_start + epochs_per_period as u128
}

/// Inflation module state as stored and exported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationGenesis {
    pub params: InflationParams,
    pub period: u64,
    pub epoch_identifier: String,
    pub epochs_per_period: u64,
    pub skipped_epochs: u64,
    pub period_mint_provisions: Vec<DecCoin>,
    pub inflation_distribution: InflationDistribution,
}

impl Default for InflationGenesis {
    fn default() -> Self {
        Self {
            params: InflationParams::default(),
            period: 0,
            epoch_identifier: DAY_EPOCH_ID.to_string(),
            epochs_per_period: DEFAULT_EPOCHS_PER_PERIOD,
            skipped_epochs: 0,
            period_mint_provisions: default_period_mint_provisions(),
            inflation_distribution: InflationDistribution::default(),
        }
    }
}

impl InflationGenesis {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.params.validate()?;
        validate_epoch_identifier(&self.epoch_identifier)?;
        if self.epochs_per_period == 0 {
            return Err(ApiError::InvalidEpochInfo(
                "epochs per period must be positive".to_string(),
            ));
        }
        for provision in &self.period_mint_provisions {
            validate_denom(&provision.denom)?;
            if provision.amount.is_negative() {
                return Err(ApiError::InvalidDecimal(provision.amount.to_string()));
            }
        }
        self.inflation_distribution.validate()
    }
}
