use crate::store::*;

pub enum StoreStaticKeys {
    LatestHeight,
    LastBlockTime,
    AppHash,
}

impl StoreStaticKeys {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            StoreStaticKeys::LatestHeight => b"latest_height",
            StoreStaticKeys::LastBlockTime => b"last_block_time",
            StoreStaticKeys::AppHash => b"app_hash",
        }
    }
}

/// Commit metadata. Written only by [`ChainStore::commit`].
pub trait MetaOps: KvRead + Sized {
    fn get_latest_height(&self) -> Result<Option<u64>, StoreError> {
        self.get_u64(ColumnFamily::Meta, StoreStaticKeys::LatestHeight.as_bytes())
    }

    fn get_last_block_time(&self) -> Result<Option<u64>, StoreError> {
        self.get_u64(ColumnFamily::Meta, StoreStaticKeys::LastBlockTime.as_bytes())
    }

    fn get_app_hash(&self) -> Result<Option<[u8; 32]>, StoreError> {
        let key = StoreStaticKeys::AppHash.as_bytes();
        match self.get(ColumnFamily::Meta, key)? {
            None => Ok(None),
            Some(bytes) => {
                let hash: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::malformed(ColumnFamily::Meta, key))?;
                Ok(Some(hash))
            }
        }
    }
}

impl<S: KvRead> MetaOps for S {}
