use gala_api::prelude::*;
use log::info;

use crate::store::{BlockContext, InflationKeys, InflationOps, StoreError};

/// Version 1 of the inflation state predates the params entry and the
/// period counters. Backfills each one that is absent and leaves present
/// values alone.
pub fn migrate_v1_to_v2(ctx: &mut BlockContext<'_>) -> Result<(), StoreError> {
    if !ctx.has_inflation_key(InflationKeys::Params)? {
        ctx.set_params(&InflationParams::default())?;
        info!("inflation migration: default params set");
    }
    if !ctx.has_inflation_key(InflationKeys::EpochsPerPeriod)? {
        ctx.set_epochs_per_period(DEFAULT_EPOCHS_PER_PERIOD);
        info!("inflation migration: epochs per period set to {DEFAULT_EPOCHS_PER_PERIOD}");
    }
    if !ctx.has_inflation_key(InflationKeys::SkippedEpochs)? {
        ctx.set_skipped_epochs(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BlockHeader, ChainStore};
    use tempdir::TempDir;

    fn setup_store() -> Result<(ChainStore, TempDir), StoreError> {
        let temp_dir = TempDir::new("rocksdb_test").map_err(StoreError::IoError)?;
        let store = ChainStore::new(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    #[test]
    fn test_backfills_missing_entries_only() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));
        ctx.set_epochs_per_period(30);

        migrate_v1_to_v2(&mut ctx)?;
        assert_eq!(ctx.get_params()?, Some(InflationParams::default()));
        assert_eq!(ctx.get_epochs_per_period()?, 30);
        assert!(ctx.has_inflation_key(InflationKeys::SkippedEpochs)?);

        // Second run is a no-op.
        let writes = ctx.pending_writes();
        migrate_v1_to_v2(&mut ctx)?;
        assert_eq!(ctx.pending_writes(), writes);
        Ok(())
    }
}
