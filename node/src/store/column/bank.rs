use gala_api::address::Address;
use gala_api::coin::Coin;

use crate::store::*;

pub enum BankKeys {
    Supply,
    Balance,
}

impl BankKeys {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            BankKeys::Supply => &[0x00],
            BankKeys::Balance => &[0x02],
        }
    }
}

fn supply_key(denom: &str) -> Vec<u8> {
    let mut key = BankKeys::Supply.as_bytes().to_vec();
    key.extend_from_slice(denom.as_bytes());
    key
}

fn balance_prefix(address: &Address) -> Vec<u8> {
    let mut key = BankKeys::Balance.as_bytes().to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

fn balance_key(address: &Address, denom: &str) -> Vec<u8> {
    let mut key = balance_prefix(address);
    key.extend_from_slice(denom.as_bytes());
    key
}

/// `0x02 | address | denom` for balances, `0x00 | denom` for supply. Zero
/// balances are deleted rather than stored.
pub trait BankOps: KvRead + Sized {
    fn get_balance(&self, address: &Address, denom: &str) -> Result<u128, StoreError> {
        Ok(self
            .get_u128(ColumnFamily::Bank, &balance_key(address, denom))?
            .unwrap_or_default())
    }

    fn set_balance(&mut self, address: &Address, denom: &str, amount: u128)
    where
        Self: KvWrite,
    {
        let key = balance_key(address, denom);
        if amount == 0 {
            self.delete(ColumnFamily::Bank, key);
        } else {
            self.put_u128(ColumnFamily::Bank, &key, amount);
        }
    }

    fn get_all_balances(&self, address: &Address) -> Result<Vec<Coin>, StoreError> {
        let prefix = balance_prefix(address);
        self.prefix_scan(ColumnFamily::Bank, &prefix)?
            .into_iter()
            .map(|(key, value)| decode_balance(&key, &value, prefix.len()).map(|(_, coin)| coin))
            .collect()
    }

    /// Every non-zero balance, ordered by address then denom.
    fn get_every_balance(&self) -> Result<Vec<(Address, Coin)>, StoreError> {
        let prefix = BankKeys::Balance.as_bytes();
        self.prefix_scan(ColumnFamily::Bank, prefix)?
            .into_iter()
            .map(|(key, value)| decode_balance(&key, &value, prefix.len() + 20))
            .collect()
    }

    fn get_supply(&self, denom: &str) -> Result<u128, StoreError> {
        Ok(self
            .get_u128(ColumnFamily::Bank, &supply_key(denom))?
            .unwrap_or_default())
    }

    fn set_supply(&mut self, denom: &str, amount: u128)
    where
        Self: KvWrite,
    {
        self.put_u128(ColumnFamily::Bank, &supply_key(denom), amount);
    }
}

impl<S: KvRead> BankOps for S {}

fn decode_balance(key: &[u8], value: &[u8], denom_offset: usize) -> Result<(Address, Coin), StoreError> {
    let malformed = || StoreError::malformed(ColumnFamily::Bank, key);
    let address = key
        .get(1..21)
        .ok_or_else(malformed)
        .and_then(|bytes| Address::from_slice(bytes).map_err(|_| malformed()))?;
    let denom = key
        .get(denom_offset..)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .ok_or_else(malformed)?;
    let raw: [u8; 16] = value.try_into().map_err(|_| malformed())?;
    Ok((
        address,
        Coin {
            denom: denom.to_string(),
            amount: u128::from_be_bytes(raw),
        },
    ))
}

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
    fn test_balances() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        let alice = Address::new([0xaa; 20]);
        let bob = Address::new([0xbb; 20]);
        ctx.set_balance(&alice, "gnet", 10);
        ctx.set_balance(&alice, "uatom", 3);
        ctx.set_balance(&bob, "gnet", 1);
        ctx.set_supply("gnet", 11);
        ctx.commit()?;

        assert_eq!(store.get_balance(&alice, "gnet")?, 10);
        assert_eq!(store.get_balance(&bob, "uatom")?, 0);
        assert_eq!(store.get_all_balances(&alice)?.len(), 2);
        assert_eq!(store.get_every_balance()?.len(), 3);
        assert_eq!(store.get_supply("gnet")?, 11);

        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));
        ctx.set_balance(&alice, "uatom", 0);
        assert_eq!(ctx.get_all_balances(&alice)?, vec![Coin { denom: "gnet".into(), amount: 10 }]);
        Ok(())
    }
}
