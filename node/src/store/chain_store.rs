use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{BoundColumnFamily, Cache, Direction, IteratorMode, Options, WriteBatch, DB};

use super::{
    column::{MetaOps, StoreStaticKeys},
    consts::*,
    context::BlockHeader,
    error::StoreError,
    kv::KvRead,
    layout::{create_cf_descriptors, ColumnFamily},
};

/// Pending writes of one block, `None` marking a delete.
pub type WriteSet = BTreeMap<(ColumnFamily, Vec<u8>), Option<Vec<u8>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    pub height: u64,
    pub app_hash: [u8; 32],
}

impl CommitInfo {
    pub fn app_hash_hex(&self) -> String {
        blake3::Hash::from(self.app_hash).to_hex().to_string()
    }
}

/// Committed chain state backed by RocksDB.
pub struct ChainStore {
    pub db: DB,
}

impl ChainStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::new_with_cache(path, CHAIN_STORE_DEFAULT_CACHE_MB)
    }

    pub fn new_with_cache<P: AsRef<Path>>(path: P, cache_size_mb: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let cache = Cache::new_lru_cache(cache_size_mb * 1024 * 1024);
        let cfs = create_cf_descriptors(&cache);
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(CHAIN_STORE_MAX_WRITE_BUFFER_SIZE);
        db_opts.set_max_write_buffer_number(CHAIN_STORE_MAX_WRITE_BUFFERS as i32);
        db_opts.increase_parallelism(num_cpus::get() as i32);
        let db = DB::open_cf_descriptors(&db_opts, path, cfs)?;
        Ok(Self { db })
    }

    pub fn new_read_only<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let cache = Cache::new_lru_cache(CHAIN_STORE_DEFAULT_CACHE_MB * 1024 * 1024);
        let cfs = create_cf_descriptors(&cache);
        let db_opts = Options::default();
        let db = DB::open_cf_descriptors_read_only(&db_opts, path, cfs, false)?;
        Ok(Self { db })
    }

    pub fn get_cf_handle(&self, column_family: ColumnFamily) -> Result<Arc<BoundColumnFamily<'_>>, StoreError> {
        self.db
            .cf_handle(column_family.as_str())
            .ok_or(StoreError::from(&column_family))
    }

    pub fn is_initialized(&self) -> Result<bool, StoreError> {
        Ok(self.get_latest_height()?.is_some())
    }

    /// Writes one block atomically and chains its app hash onto the
    /// previous one.
    pub fn commit(&self, header: &BlockHeader, writes: &WriteSet) -> Result<CommitInfo, StoreError> {
        let parent = self.get_app_hash()?.unwrap_or(GENESIS_PARENT_HASH);
        let app_hash = compute_app_hash(&parent, header, writes);

        let mut batch = WriteBatch::default();
        for ((cf, key), value) in writes {
            let handle = self.get_cf_handle(*cf)?;
            match value {
                Some(value) => batch.put_cf(&handle, key, value),
                None => batch.delete_cf(&handle, key),
            }
        }

        let meta = self.get_cf_handle(ColumnFamily::Meta)?;
        batch.put_cf(&meta, StoreStaticKeys::LatestHeight.as_bytes(), header.height.to_be_bytes());
        batch.put_cf(&meta, StoreStaticKeys::LastBlockTime.as_bytes(), header.time.to_be_bytes());
        batch.put_cf(&meta, StoreStaticKeys::AppHash.as_bytes(), app_hash);
        self.db.write(batch)?;

        Ok(CommitInfo {
            height: header.height,
            app_hash,
        })
    }
}

fn compute_app_hash(parent: &[u8; 32], header: &BlockHeader, writes: &WriteSet) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(parent);
    hasher.update(&header.height.to_be_bytes());
    hasher.update(&header.time.to_be_bytes());
    for ((cf, key), value) in writes {
        hasher.update(&[cf.tag()]);
        hasher.update(&(key.len() as u32).to_be_bytes());
        hasher.update(key);
        match value {
            Some(value) => {
                hasher.update(&[1]);
                hasher.update(&(value.len() as u32).to_be_bytes());
                hasher.update(value);
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }
    *hasher.finalize().as_bytes()
}

impl KvRead for ChainStore {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let handle = self.get_cf_handle(cf)?;
        Ok(self.db.get_cf(&handle, key)?)
    }

    fn prefix_scan(
        &self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let handle = self.get_cf_handle(cf)?;
        let mut entries = Vec::new();
        let iter = self
            .db
            .iterator_cf(&handle, IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }
}
