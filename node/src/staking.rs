use std::collections::{BTreeMap, BTreeSet};

use gala_api::prelude::*;
use log::{debug, warn};

use crate::store::{BlockContext, KvRead, StakingOps, StoreError};

/// The slice of the staking module this chain core depends on: the power
/// index and the validator set handed to consensus.
#[derive(Clone, Debug)]
pub struct StakingKeeper {
    pub max_validators: u32,
}

impl Default for StakingKeeper {
    fn default() -> Self {
        Self {
            max_validators: DEFAULT_MAX_VALIDATORS,
        }
    }
}

impl StakingKeeper {
    pub fn new(max_validators: u32) -> Self {
        Self { max_validators }
    }

    pub fn get_all_validators<S: KvRead>(&self, store: &S) -> Result<Vec<Validator>, StoreError> {
        store.get_all_validators()
    }

    /// Indexes the validator at its current consensus power. Jailed
    /// validators are left out of the index.
    pub fn set_validator_by_power_index(&self, ctx: &mut BlockContext<'_>, validator: &Validator) {
        if validator.jailed {
            return;
        }
        ctx.put_power_index_key(power_index_key(validator), &validator.operator);
    }

    pub fn delete_validator_by_power_index(&self, ctx: &mut BlockContext<'_>, validator: &Validator) {
        ctx.delete_power_index_key(power_index_key(validator));
    }

    /// Stores a validator and moves its power index entry.
    pub fn set_validator(&self, ctx: &mut BlockContext<'_>, validator: &Validator) -> Result<(), StoreError> {
        if let Some(previous) = ctx.get_validator(&validator.operator)? {
            self.delete_validator_by_power_index(ctx, &previous);
        }
        ctx.set_validator(validator)?;
        self.set_validator_by_power_index(ctx, validator);
        Ok(())
    }

    /// Walks the power index from the top, keeps the `max_validators`
    /// strongest non-zero validators and diffs them against the last
    /// committed powers. Validators falling out of the set get a zero-power
    /// update.
    pub fn apply_and_return_validator_set_updates(
        &self,
        ctx: &mut BlockContext<'_>,
    ) -> Result<Vec<ValidatorUpdate>, StoreError> {
        let mut last: BTreeMap<Address, u64> = ctx.get_last_validator_powers()?.into_iter().collect();
        let mut seen = BTreeSet::new();
        let mut updates = Vec::new();

        for key in ctx.get_power_index_keys()?.into_iter().rev() {
            if seen.len() >= self.max_validators as usize {
                break;
            }
            let (_, operator) = match parse_power_index_key(&key) {
                Ok(parsed) => parsed,
                Err(_) => {
                    warn!("skipping malformed power index key {}", String::from_utf8_lossy(&key));
                    continue;
                }
            };
            if !seen.insert(operator) {
                continue;
            }

            let mut validator = ctx
                .get_validator(&operator)?
                .ok_or_else(|| StoreError::ValidatorNotFound(operator.to_string()))?;
            let power = validator.consensus_power();
            if validator.jailed || power == 0 {
                seen.remove(&operator);
                continue;
            }

            if validator.status != ValidatorStatus::Bonded {
                validator.status = ValidatorStatus::Bonded;
                ctx.set_validator(&validator)?;
            }
            if last.remove(&operator) != Some(power) {
                ctx.set_last_validator_power(&operator, power);
                updates.push(ValidatorUpdate { operator, power });
            }
        }

        for (operator, _) in last {
            if let Some(mut validator) = ctx.get_validator(&operator)? {
                validator.status = ValidatorStatus::Unbonding;
                ctx.set_validator(&validator)?;
            }
            ctx.delete_last_validator_power(&operator);
            updates.push(ValidatorUpdate { operator, power: 0 });
        }

        debug!("validator set updates: {}", updates.len());
        Ok(updates)
    }
}
