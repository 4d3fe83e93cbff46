pub const CHAIN_STORE_PRIMARY_DB: &str = "db_chainstore";
pub const CHAIN_STORE_MAX_WRITE_BUFFER_SIZE: usize = 8 * 1024 * 1024; // 8 MB
pub const CHAIN_STORE_MAX_WRITE_BUFFERS: usize = 4;
pub const CHAIN_STORE_DEFAULT_CACHE_MB: usize = 64;

/// Hash chained into the first commit.
pub const GENESIS_PARENT_HASH: [u8; 32] = [0u8; 32];
