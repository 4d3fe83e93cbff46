use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use super::{error::StoreError, layout::ColumnFamily};

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(codec().serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(codec().deserialize(bytes)?)
}

/// Read access to the keyed namespaces of the chain state.
pub trait KvRead {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// All entries whose key starts with `prefix`, ascending by key.
    fn prefix_scan(
        &self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn get_value<T: DeserializeOwned>(
        &self,
        cf: ColumnFamily,
        key: &[u8],
    ) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        self.get(cf, key)?.map(|bytes| decode(&bytes)).transpose()
    }

    fn get_u64(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<u64>, StoreError>
    where
        Self: Sized,
    {
        match self.get(cf, key)? {
            None => Ok(None),
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::malformed(cf, key))?;
                Ok(Some(u64::from_be_bytes(raw)))
            }
        }
    }

    fn get_u128(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<u128>, StoreError>
    where
        Self: Sized,
    {
        match self.get(cf, key)? {
            None => Ok(None),
            Some(bytes) => {
                let raw: [u8; 16] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::malformed(cf, key))?;
                Ok(Some(u128::from_be_bytes(raw)))
            }
        }
    }
}

/// Buffered writes. Nothing reaches disk until the owning block commits.
pub trait KvWrite: KvRead {
    fn put(&mut self, cf: ColumnFamily, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, cf: ColumnFamily, key: Vec<u8>);

    fn put_value<T: Serialize>(
        &mut self,
        cf: ColumnFamily,
        key: &[u8],
        value: &T,
    ) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let bytes = encode(value)?;
        self.put(cf, key.to_vec(), bytes);
        Ok(())
    }

    fn put_u64(&mut self, cf: ColumnFamily, key: &[u8], value: u64)
    where
        Self: Sized,
    {
        self.put(cf, key.to_vec(), value.to_be_bytes().to_vec());
    }

    fn put_u128(&mut self, cf: ColumnFamily, key: &[u8], value: u128)
    where
        Self: Sized,
    {
        self.put(cf, key.to_vec(), value.to_be_bytes().to_vec());
    }
}
