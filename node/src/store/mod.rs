pub mod consts;
pub mod error;
pub mod layout;
pub mod column;
mod kv;
mod context;
mod chain_store;
mod helpers;

pub use consts::*;
pub use error::StoreError;
pub use layout::ColumnFamily;
pub use kv::{decode, encode, KvRead, KvWrite};
pub use context::{BlockContext, BlockHeader};
pub use chain_store::{ChainStore, CommitInfo};
pub use helpers::{primary, read_only};
pub use column::*;
