use log::debug;

use crate::bank::BankKeeper;
use crate::epochs::EpochHooks;
use crate::inflation::InflationKeeper;
use crate::store::BlockContext;

/// Plugs the inflation distributor into the epoch timer.
pub struct InflationHooks<B> {
    keeper: InflationKeeper<B>,
}

impl<B: BankKeeper> InflationHooks<B> {
    pub fn new(keeper: InflationKeeper<B>) -> Self {
        Self { keeper }
    }
}

impl<B: BankKeeper + Send + Sync> EpochHooks for InflationHooks<B> {
    fn after_epoch_end(&self, _ctx: &mut BlockContext<'_>, _identifier: &str, _epoch_number: u64) {}

    fn before_epoch_start(&self, ctx: &mut BlockContext<'_>, identifier: &str, epoch_number: u64) {
        let outcome = self.keeper.on_epoch_start(ctx, identifier, epoch_number);
        debug!("inflation at {identifier} #{epoch_number}: {}", outcome.label());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gala_api::prelude::*;
    use tempdir::TempDir;

    use super::*;
    use crate::bank::StoreBank;
    use crate::epochs::EpochsKeeper;
    use crate::inflation::init_genesis;
    use crate::store::{BankOps, BlockHeader, ChainStore, StoreError};

    fn setup_store() -> Result<(ChainStore, TempDir), StoreError> {
        let temp_dir = TempDir::new("rocksdb_test").map_err(StoreError::IoError)?;
        let store = ChainStore::new(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    #[test]
    fn test_only_the_configured_epoch_mints() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let hooks = InflationHooks::new(InflationKeeper::new(StoreBank::default()));
        let epochs = EpochsKeeper::new().with_hooks(Arc::new(hooks));

        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        init_genesis(&mut ctx, &InflationGenesis::default())?;
        epochs.init_genesis(&mut ctx, &default_epochs(0))?;
        ctx.commit()?;

        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));
        epochs.begin_block(&mut ctx)?;
        let mints: Vec<_> = ctx.events().iter().filter(|e| e.kind == EVENT_TYPE_MINT).collect();
        assert_eq!(mints.len(), 1);
        // 548402880.90 / 365, truncated.
        assert_eq!(mints[0].get(ATTRIBUTE_AMOUNT), Some("1502473"));
        assert_eq!(ctx.get_supply(DEFAULT_DENOM)?, 1_502_473);
        Ok(())
    }
}
