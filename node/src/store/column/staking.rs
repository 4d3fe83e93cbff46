use gala_api::address::Address;
use gala_api::staking::*;

use crate::store::*;

/// Validator records, the power index and last committed powers.
pub trait StakingOps: KvRead + Sized {
    fn get_validator(&self, operator: &Address) -> Result<Option<Validator>, StoreError> {
        self.get_value(ColumnFamily::Staking, &validator_key(operator))
    }

    fn set_validator(&mut self, validator: &Validator) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        self.put_value(ColumnFamily::Staking, &validator_key(&validator.operator), validator)
    }

    fn get_all_validators(&self) -> Result<Vec<Validator>, StoreError> {
        let prefix = [u8::from(StakingPrefix::Validator)];
        self.prefix_scan(ColumnFamily::Staking, &prefix)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    /// Raw power index entries in ascending key order.
    fn get_power_index_keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .prefix_scan(ColumnFamily::Staking, &power_index_prefix())?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    fn put_power_index_key(&mut self, key: Vec<u8>, operator: &Address)
    where
        Self: KvWrite,
    {
        self.put(ColumnFamily::Staking, key, operator.as_bytes().to_vec());
    }

    fn delete_power_index_key(&mut self, key: Vec<u8>)
    where
        Self: KvWrite,
    {
        self.delete(ColumnFamily::Staking, key);
    }

    fn get_last_validator_power(&self, operator: &Address) -> Result<Option<u64>, StoreError> {
        self.get_u64(ColumnFamily::Staking, &last_validator_power_key(operator))
    }

    fn set_last_validator_power(&mut self, operator: &Address, power: u64)
    where
        Self: KvWrite,
    {
        self.put_u64(ColumnFamily::Staking, &last_validator_power_key(operator), power);
    }

    fn delete_last_validator_power(&mut self, operator: &Address)
    where
        Self: KvWrite,
    {
        self.delete(ColumnFamily::Staking, last_validator_power_key(operator));
    }

    fn get_last_validator_powers(&self) -> Result<Vec<(Address, u64)>, StoreError> {
        let prefix = [u8::from(StakingPrefix::LastValidatorPower)];
        self.prefix_scan(ColumnFamily::Staking, &prefix)?
            .into_iter()
            .map(|(key, value)| {
                let operator = Address::from_slice(&key[1..])?;
                let raw: [u8; 8] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::malformed(ColumnFamily::Staking, &key))?;
                Ok((operator, u64::from_be_bytes(raw)))
            })
            .collect()
    }
}

impl<S: KvRead> StakingOps for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn setup_store() -> Result<(ChainStore, TempDir), StoreError> {
        let temp_dir = TempDir::new("rocksdb_test").map_err(StoreError::IoError)?;
        let store = ChainStore::new(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    #[test]
    fn test_validators_and_last_powers() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        let a = Validator::new(Address::new([1; 20]), 5_000_000);
        let b = Validator::new(Address::new([2; 20]), 7_000_000);
        ctx.set_validator(&a)?;
        ctx.set_validator(&b)?;
        ctx.set_last_validator_power(&a.operator, 5);
        ctx.commit()?;

        assert_eq!(store.get_all_validators()?, vec![a.clone(), b.clone()]);
        assert_eq!(store.get_validator(&b.operator)?, Some(b));
        assert_eq!(store.get_last_validator_powers()?, vec![(a.operator, 5)]);
        assert_eq!(store.get_last_validator_power(&a.operator)?, Some(5));
        Ok(())
    }

    #[test]
    fn test_power_index_keys_are_separate_from_validators() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        let v = Validator::new(Address::new([3; 20]), 2_000_000);
        ctx.set_validator(&v)?;
        ctx.put_power_index_key(power_index_key(&v), &v.operator);

        assert_eq!(ctx.get_power_index_keys()?, vec![power_index_key(&v)]);
        assert_eq!(ctx.get_all_validators()?.len(), 1);
        ctx.delete_power_index_key(power_index_key(&v));
        assert!(ctx.get_power_index_keys()?.is_empty());
        Ok(())
    }
}
