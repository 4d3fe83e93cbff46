use gala_api::error::ApiError;
use thiserror::Error;

use super::layout::ColumnFamily;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("Invalid value: {0}")]
    Api(#[from] ApiError),
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(&'static str),
    #[error("Malformed value in {cf} at key {key}")]
    MalformedValue { cf: &'static str, key: String },
    #[error("Missing value in {cf}: {key}")]
    MissingValue { cf: &'static str, key: String },
    #[error("Validator not found: {0}")]
    ValidatorNotFound(String),
    #[error("Store is not initialized")]
    NotInitialized,
    #[error("Invalid path")]
    InvalidPath,
}

impl StoreError {
    pub fn malformed(cf: ColumnFamily, key: &[u8]) -> Self {
        StoreError::MalformedValue {
            cf: cf.as_str(),
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }

    pub fn missing(cf: ColumnFamily, key: &[u8]) -> Self {
        StoreError::MissingValue {
            cf: cf.as_str(),
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }
}

impl From<&ColumnFamily> for StoreError {
    fn from(value: &ColumnFamily) -> Self {
        StoreError::ColumnFamilyNotFound(value.as_str())
    }
}
