use gala_api::inflation::InflationGenesis;
use log::info;

use crate::store::{BlockContext, InflationOps, KvRead, StoreError};

pub fn init_genesis(ctx: &mut BlockContext<'_>, genesis: &InflationGenesis) -> Result<(), StoreError> {
    genesis.validate()?;
    ctx.set_params(&genesis.params)?;
    ctx.set_period(genesis.period);
    ctx.set_epoch_identifier(&genesis.epoch_identifier);
    ctx.set_epochs_per_period(genesis.epochs_per_period);
    ctx.set_skipped_epochs(genesis.skipped_epochs);
    ctx.set_period_mint_provisions(&genesis.period_mint_provisions)?;
    ctx.set_inflation_distribution(&genesis.inflation_distribution)?;
    info!(
        "inflation genesis: {} periods of {} {} epochs",
        genesis.period_mint_provisions.len(),
        genesis.epochs_per_period,
        genesis.epoch_identifier
    );
    Ok(())
}

/// Missing optional entries export as their defaults.
pub fn export_genesis<S: KvRead>(store: &S) -> Result<InflationGenesis, StoreError> {
    let defaults = InflationGenesis::default();
    Ok(InflationGenesis {
        params: store.get_params()?.unwrap_or(defaults.params),
        period: store.get_period()?,
        epoch_identifier: store.get_epoch_identifier()?.unwrap_or(defaults.epoch_identifier),
        epochs_per_period: store.get_epochs_per_period()?,
        skipped_epochs: store.get_skipped_epochs()?,
        period_mint_provisions: store.get_period_mint_provisions()?,
        inflation_distribution: store
            .get_inflation_distribution()?
            .unwrap_or(defaults.inflation_distribution),
    })
}
