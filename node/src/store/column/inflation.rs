use gala_api::coin::DecCoin;
use gala_api::inflation::{InflationDistribution, InflationParams};

use crate::store::*;

pub enum InflationKeys {
    Params,
    Period,
    EpochIdentifier,
    EpochsPerPeriod,
    SkippedEpochs,
    PeriodMintProvisions,
    InflationDistribution,
}

impl InflationKeys {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            InflationKeys::Params => b"params_inflation",
            InflationKeys::Period => b"period_inflation",
            InflationKeys::EpochIdentifier => b"epoch_identifier_inflation",
            InflationKeys::EpochsPerPeriod => b"epochs_per_period_inflation",
            InflationKeys::SkippedEpochs => b"skipped_epochs_inflation",
            InflationKeys::PeriodMintProvisions => b"period_mint_provisions_inflation",
            InflationKeys::InflationDistribution => b"inflation_distribution_inflation",
        }
    }
}

/// Counters read as zero when unset.
pub trait InflationOps: KvRead + Sized {
    fn has_inflation_key(&self, key: InflationKeys) -> Result<bool, StoreError> {
        Ok(self.get(ColumnFamily::Inflation, key.as_bytes())?.is_some())
    }

    fn get_params(&self) -> Result<Option<InflationParams>, StoreError> {
        self.get_value(ColumnFamily::Inflation, InflationKeys::Params.as_bytes())
    }

    fn set_params(&mut self, params: &InflationParams) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        self.put_value(ColumnFamily::Inflation, InflationKeys::Params.as_bytes(), params)
    }

    fn get_period(&self) -> Result<u64, StoreError> {
        Ok(self
            .get_u64(ColumnFamily::Inflation, InflationKeys::Period.as_bytes())?
            .unwrap_or_default())
    }

    fn set_period(&mut self, period: u64)
    where
        Self: KvWrite,
    {
        self.put_u64(ColumnFamily::Inflation, InflationKeys::Period.as_bytes(), period);
    }

    fn get_epoch_identifier(&self) -> Result<Option<String>, StoreError> {
        let key = InflationKeys::EpochIdentifier.as_bytes();
        match self.get(ColumnFamily::Inflation, key)? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::malformed(ColumnFamily::Inflation, key)),
        }
    }

    fn set_epoch_identifier(&mut self, identifier: &str)
    where
        Self: KvWrite,
    {
        self.put(
            ColumnFamily::Inflation,
            InflationKeys::EpochIdentifier.as_bytes().to_vec(),
            identifier.as_bytes().to_vec(),
        );
    }

    fn get_epochs_per_period(&self) -> Result<u64, StoreError> {
        Ok(self
            .get_u64(ColumnFamily::Inflation, InflationKeys::EpochsPerPeriod.as_bytes())?
            .unwrap_or_default())
    }

    fn set_epochs_per_period(&mut self, epochs: u64)
    where
        Self: KvWrite,
    {
        self.put_u64(ColumnFamily::Inflation, InflationKeys::EpochsPerPeriod.as_bytes(), epochs);
    }

    fn get_skipped_epochs(&self) -> Result<u64, StoreError> {
        Ok(self
            .get_u64(ColumnFamily::Inflation, InflationKeys::SkippedEpochs.as_bytes())?
            .unwrap_or_default())
    }

    fn set_skipped_epochs(&mut self, skipped: u64)
    where
        Self: KvWrite,
    {
        self.put_u64(ColumnFamily::Inflation, InflationKeys::SkippedEpochs.as_bytes(), skipped);
    }

    /// Unlike the counters, a missing schedule is an error.
    fn get_period_mint_provisions(&self) -> Result<Vec<DecCoin>, StoreError> {
        let key = InflationKeys::PeriodMintProvisions.as_bytes();
        self.get_value(ColumnFamily::Inflation, key)?
            .ok_or_else(|| StoreError::missing(ColumnFamily::Inflation, key))
    }

    fn set_period_mint_provisions(&mut self, provisions: &[DecCoin]) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        self.put_value(
            ColumnFamily::Inflation,
            InflationKeys::PeriodMintProvisions.as_bytes(),
            &provisions,
        )
    }

    fn get_inflation_distribution(&self) -> Result<Option<InflationDistribution>, StoreError> {
        self.get_value(ColumnFamily::Inflation, InflationKeys::InflationDistribution.as_bytes())
    }

    fn set_inflation_distribution(&mut self, distribution: &InflationDistribution) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        self.put_value(
            ColumnFamily::Inflation,
            InflationKeys::InflationDistribution.as_bytes(),
            distribution,
        )
    }
}

impl<S: KvRead> InflationOps for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_api::inflation::default_period_mint_provisions;
    use tempdir::TempDir;

    fn setup_store() -> Result<(ChainStore, TempDir), StoreError> {
        let temp_dir = TempDir::new("rocksdb_test").map_err(StoreError::IoError)?;
        let store = ChainStore::new(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    #[test]
    fn test_counters_default_to_zero() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        assert_eq!(store.get_period()?, 0);
        assert_eq!(store.get_skipped_epochs()?, 0);
        assert_eq!(store.get_epoch_identifier()?, None);
        assert!(!store.has_inflation_key(InflationKeys::EpochsPerPeriod)?);
        Ok(())
    }

    #[test]
    fn test_missing_provisions_is_an_error() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        assert!(matches!(
            store.get_period_mint_provisions(),
            Err(StoreError::MissingValue { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_state_round_trip() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        let provisions = default_period_mint_provisions();
        ctx.set_params(&InflationParams::default())?;
        ctx.set_period(3);
        ctx.set_epoch_identifier("day");
        ctx.set_epochs_per_period(365);
        ctx.set_period_mint_provisions(&provisions)?;
        ctx.set_inflation_distribution(&InflationDistribution::default())?;
        ctx.commit()?;

        assert_eq!(store.get_params()?, Some(InflationParams::default()));
        assert_eq!(store.get_period()?, 3);
        assert_eq!(store.get_epoch_identifier()?.as_deref(), Some("day"));
        assert_eq!(store.get_epochs_per_period()?, 365);
        assert_eq!(store.get_period_mint_provisions()?, provisions);
        assert_eq!(store.get_inflation_distribution()?, Some(InflationDistribution::default()));
        Ok(())
    }
}
