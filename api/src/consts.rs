// ====================================================================
// Module Names
// ====================================================================
/// Module account and store namespace names
pub const INFLATION_MODULE:     &str = "inflation";
pub const FEE_COLLECTOR_MODULE: &str = "fee_collector";
pub const BANK_MODULE:          &str = "bank";
pub const STAKING_MODULE:       &str = "staking";
pub const EPOCHS_MODULE:        &str = "epochs";
pub const UPGRADE_MODULE:       &str = "upgrade";

/// Bonded and unbonded staking pools
pub const BONDED_POOL_MODULE:     &str = "bonded_tokens_pool";
pub const NOT_BONDED_POOL_MODULE: &str = "not_bonded_tokens_pool";

// ====================================================================
// Token Economics
// ====================================================================
/// Staking and fee denomination
pub const DEFAULT_DENOM: &str = "gnet";
/// Tokens per unit of consensus power
pub const DEFAULT_POWER_REDUCTION: u128 = 1_000_000;
/// Default cap on the active validator set
pub const DEFAULT_MAX_VALIDATORS: u32 = 100;

// ====================================================================
// Decimal Arithmetic
// ====================================================================
/// Number of fractional digits carried by `Dec`
pub const DEC_PRECISION: u32 = 18;
/// Raw representation of 1.0
pub const DEC_ONE_RAW: i128 = 1_000_000_000_000_000_000;

// ====================================================================
// Epochs
// ====================================================================
pub const DAY_EPOCH_ID:  &str = "day";
pub const WEEK_EPOCH_ID: &str = "week";
pub const HOUR_EPOCH_ID: &str = "hour";

pub const HOUR_SECONDS: u64 = 60 * 60;
pub const DAY_SECONDS:  u64 = 24 * HOUR_SECONDS;
pub const WEEK_SECONDS: u64 = 7 * DAY_SECONDS;

// ====================================================================
// Inflation
// ====================================================================
/// One period is roughly one year of daily epochs
pub const DEFAULT_EPOCHS_PER_PERIOD: u64 = 365;

/// Tokens minted over each period in hundredths of a token, decaying
/// yearly. The 36 periods add up to roughly 3,000,000,000 tokens.
pub const DEFAULT_PERIOD_MINT_PROVISIONS_CENTS: [u64; 36] = [
    54_840_288_090, 44_822_467_043, 36_634_628_006, 29_942_483_009, 24_472_810_004,
    20_002_296_072, 16_348_423_097, 13_362_013_087, 10_921_139_025,  8_926_145_069,
     7_295_582_091,  5_962_879_037,  4_873_624_033,  3_983_346_041,  3_255_697_092,
     2_660_970_092,  2_174_884_028,  1_777_592_039,  1_452_874_086,  1_187_474_034,
       970_555_024,    793_261_034,    648_354_018,    529_917_059,    433_116_014,
       353_997_066,    289_331_097,    236_478_093,    193_280_069,    157_973_059,
       129_116_014,    105_530_015,     86_252_068,     70_496_067,     57_618_086,
        47_093_047,
];

// ====================================================================
// Addresses
// ====================================================================
/// Account address length in bytes (EVM compatible)
pub const ADDRESS_LEN: usize = 20;
/// Domain separator for module account derivation
pub const MODULE_ADDRESS_DOMAIN: &[u8] = b"module:";
