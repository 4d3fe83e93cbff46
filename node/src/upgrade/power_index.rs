use std::collections::BTreeMap;

use gala_api::prelude::*;
use log::{info, warn};

use crate::staking::StakingKeeper;
use crate::store::{BlockContext, StakingOps, StoreError};
use crate::upgrade::{UpgradeEnv, UpgradeError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub validators: usize,
    pub removed: usize,
    pub malformed: usize,
    pub updates: Vec<ValidatorUpdate>,
}

/// Rebuilds the validators-by-power index from the validator records.
///
/// Every existing index entry that decodes to a validator's address is
/// deleted, then one entry is written at the validator's current power.
/// The validator set is recomputed once at the end and its updates are
/// queued on the block. Runs entirely inside the block overlay, so an error
/// leaves nothing behind.
pub fn repair_validator_power_index(
    ctx: &mut BlockContext<'_>,
    staking: &StakingKeeper,
) -> Result<RepairReport, StoreError> {
    let mut report = RepairReport::default();

    let mut entries: BTreeMap<Address, Vec<Vec<u8>>> = BTreeMap::new();
    for key in ctx.get_power_index_keys()? {
        match parse_power_index_key(&key) {
            Ok((_, operator)) => entries.entry(operator).or_default().push(key),
            Err(_) => {
                warn!("power index repair: leaving undecodable key {}", hex::encode(&key));
                report.malformed += 1;
            }
        }
    }

    for validator in staking.get_all_validators(&*ctx)? {
        let stale = entries.remove(&validator.operator).unwrap_or_default();
        let removed = stale.len();
        for key in stale {
            ctx.delete_power_index_key(key);
        }
        staking.set_validator_by_power_index(ctx, &validator);

        if removed != 1 {
            info!(
                "power index repair: validator {} had {removed} entries",
                validator.operator
            );
        }
        ctx.emit(
            Event::new(EVENT_TYPE_POWER_INDEX_REPAIR)
                .attr(ATTRIBUTE_VALIDATOR, validator.operator)
                .attr(ATTRIBUTE_POWER, validator.consensus_power())
                .attr(ATTRIBUTE_REMOVED, removed),
        );
        report.validators += 1;
        report.removed += removed;
    }

    for (operator, keys) in entries {
        warn!(
            "power index repair: {} entries point at unknown validator {operator}",
            keys.len()
        );
    }

    report.updates = staking.apply_and_return_validator_set_updates(ctx)?;
    ctx.add_validator_updates(report.updates.clone());
    info!(
        "power index repaired: {} validators, {} entries removed, {} set updates",
        report.validators,
        report.removed,
        report.updates.len()
    );
    Ok(report)
}

pub fn power_index_mutation(ctx: &mut BlockContext<'_>, env: &UpgradeEnv<'_>) -> Result<(), UpgradeError> {
    repair_validator_power_index(ctx, &env.keepers.staking)?;
    Ok(())
}
