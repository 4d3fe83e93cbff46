mod meta;
mod upgrade;
mod inflation;
mod staking;
mod bank;
mod epochs;

pub use meta::{MetaOps, StoreStaticKeys};
pub use upgrade::{UpgradeKeys, UpgradeOps};
pub use inflation::{InflationKeys, InflationOps};
pub use staking::StakingOps;
pub use bank::{BankKeys, BankOps};
pub use epochs::EpochOps;
