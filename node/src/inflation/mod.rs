mod genesis;
mod hooks;
mod keeper;
mod migrations;

pub use genesis::{export_genesis, init_genesis};
pub use hooks::InflationHooks;
pub use keeper::{FailedTransfer, InflationKeeper, InflationOutcome, MintReport, Transfer};
pub use migrations::migrate_v1_to_v2;
