mod coordinator;
mod error;
mod handler;
mod migrations;
mod module_manager;
mod power_index;
mod registry;
mod upgrade_info;

pub use coordinator::{Coordinator, PlanQueue, ReconcileOutcome};
pub use error::UpgradeError;
pub use handler::{MigrationHandler, UpgradeEnv};
pub use migrations::*;
pub use module_manager::{MigrationStep, ModuleManager};
pub use power_index::{power_index_mutation, repair_validator_power_index, RepairReport};
pub use registry::{HandlerRegistry, RegistryBuilder, UpgradeHandler};
pub use upgrade_info::{UpgradeInfoFile, UPGRADE_INFO_FILE};
