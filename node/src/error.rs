use gala_api::error::ApiError;
use thiserror::Error;

use crate::bank::BankError;
use crate::store::StoreError;
use crate::upgrade::UpgradeError;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
    #[error("Bank error: {0}")]
    Bank(#[from] BankError),
    #[error("Invalid value: {0}")]
    Api(#[from] ApiError),
    #[error("Invalid genesis: {0}")]
    Genesis(String),
    #[error("Genesis file is malformed: {0}")]
    GenesisFormat(#[from] serde_json::Error),
    #[error("Chain is not initialized")]
    NotInitialized,
    #[error("Chain is already initialized at height {0}")]
    AlreadyInitialized(u64),
    #[error("Expected block height {expected}, got {got}")]
    UnexpectedHeight { expected: u64, got: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// A fatal error means the node must stop producing blocks; the failed
    /// block was not committed.
    pub fn is_fatal(&self) -> bool {
        match self {
            NodeError::Upgrade(e) => e.halts_chain(),
            NodeError::Store(_) | NodeError::Bank(_) => true,
            NodeError::Api(_)
            | NodeError::Genesis(_)
            | NodeError::GenesisFormat(_)
            | NodeError::NotInitialized
            | NodeError::AlreadyInitialized(_)
            | NodeError::UnexpectedHeight { .. }
            | NodeError::Io(_) => false,
        }
    }
}
