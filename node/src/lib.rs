pub mod app;
pub mod bank;
pub mod epochs;
pub mod error;
pub mod genesis;
pub mod inflation;
pub mod metrics;
pub mod staking;
pub mod store;
pub mod upgrade;
pub mod utils;

pub use app::{App, AppBuilder, BlockResult, Keepers, Msg};
pub use error::NodeError;
pub use genesis::GenesisState;
