use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, Options};

/// One column family per module namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnFamily {
    Meta,
    Upgrade,
    Inflation,
    Staking,
    Bank,
    Epochs,
}

impl ColumnFamily {
    pub const ALL: [ColumnFamily; 6] = [
        ColumnFamily::Meta,
        ColumnFamily::Upgrade,
        ColumnFamily::Inflation,
        ColumnFamily::Staking,
        ColumnFamily::Bank,
        ColumnFamily::Epochs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnFamily::Meta => "meta",
            ColumnFamily::Upgrade => "upgrade",
            ColumnFamily::Inflation => "inflation",
            ColumnFamily::Staking => "staking",
            ColumnFamily::Bank => "bank",
            ColumnFamily::Epochs => "epochs",
        }
    }

    /// Stable tag mixed into the app hash.
    pub fn tag(&self) -> u8 {
        match self {
            ColumnFamily::Meta => 0,
            ColumnFamily::Upgrade => 1,
            ColumnFamily::Inflation => 2,
            ColumnFamily::Staking => 3,
            ColumnFamily::Bank => 4,
            ColumnFamily::Epochs => 5,
        }
    }
}

pub fn create_cf_descriptors(cache: &Cache) -> Vec<ColumnFamilyDescriptor> {
    ColumnFamily::ALL
        .iter()
        .map(|cf| {
            let mut opts = Options::default();
            match cf {
                // Power index and balances are scanned by prefix every block.
                ColumnFamily::Staking | ColumnFamily::Bank => {
                    let mut bbt = BlockBasedOptions::default();
                    bbt.set_block_size(16 * 1024);
                    bbt.set_bloom_filter(10.0, false);
                    bbt.set_cache_index_and_filter_blocks(true);
                    bbt.set_block_cache(cache);
                    opts.set_block_based_table_factory(&bbt);
                    opts.set_level_compaction_dynamic_level_bytes(true);
                }
                _ => {
                    let mut bbt = BlockBasedOptions::default();
                    bbt.set_block_cache(cache);
                    opts.set_block_based_table_factory(&bbt);
                }
            }
            opts.set_compression_type(DBCompressionType::None);
            ColumnFamilyDescriptor::new(cf.as_str(), opts)
        })
        .collect()
}
