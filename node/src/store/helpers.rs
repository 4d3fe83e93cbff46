use std::path::Path;

use super::{consts::*, ChainStore, StoreError};

/// Opens (creating if needed) the writable store under `data_dir`.
pub fn primary<P: AsRef<Path>>(data_dir: P, cache_size_mb: usize) -> Result<ChainStore, StoreError> {
    let db_primary = data_dir.as_ref().join(CHAIN_STORE_PRIMARY_DB);
    std::fs::create_dir_all(&db_primary).map_err(StoreError::IoError)?;
    ChainStore::new_with_cache(&db_primary, cache_size_mb)
}

/// Opens the store under `data_dir` for queries while a node may be running.
pub fn read_only<P: AsRef<Path>>(data_dir: P) -> Result<ChainStore, StoreError> {
    let db_primary = data_dir.as_ref().join(CHAIN_STORE_PRIMARY_DB);
    if !db_primary.exists() {
        return Err(StoreError::NotInitialized);
    }
    ChainStore::new_read_only(&db_primary)
}
