use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum UpgradeError {
    #[error("UPGRADE \"{name}\" NEEDED at height {height}: no handler is registered in this binary")]
    UpgradeNeeded { name: String, height: u64 },
    #[error("Upgrade {name} failed: {reason}")]
    MutationFailed { name: String, reason: String },
    #[error("No migration registered for module {module} from version {from} to {to}")]
    MissingMigration { module: String, from: u64, to: u64 },
    #[error("Module {module} cannot be downgraded from version {from} to {to}")]
    Downgrade { module: String, from: u64, to: u64 },
    #[error("Upgrade {name} cannot run at height {height}, its trigger height is {trigger}")]
    BelowTrigger { name: String, height: u64, trigger: u64 },
    #[error("Upgrade {name} is out of sequence with {other}")]
    OutOfOrder { name: String, other: String },
    #[error("Invalid upgrade plan: {0}")]
    InvalidPlan(String),
    #[error("Upgrade {0} has already been applied")]
    AlreadyApplied(String),
    #[error("Upgrade info file error: {0}")]
    UpgradeInfoIo(#[from] std::io::Error),
    #[error("Upgrade info file is malformed: {0}")]
    UpgradeInfoFormat(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl UpgradeError {
    pub fn mutation(name: &str, reason: impl ToString) -> Self {
        UpgradeError::MutationFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the block that raised this must not be committed.
    pub fn halts_chain(&self) -> bool {
        !matches!(self, UpgradeError::InvalidPlan(_) | UpgradeError::AlreadyApplied(_))
    }
}
