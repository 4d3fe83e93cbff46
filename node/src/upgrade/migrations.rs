use gala_api::upgrade::MigrationDescriptor;

use crate::store::BlockContext;
use crate::upgrade::{power_index_mutation, UpgradeEnv, UpgradeError};

/// Custom state surgery run before the module migrations of an upgrade.
pub type MutationFn = fn(&mut BlockContext<'_>, &UpgradeEnv<'_>) -> Result<(), UpgradeError>;

pub const V0_1_2: MigrationDescriptor = MigrationDescriptor::at_height(
    "0.1.2",
    16951,
    "Addresses a critical staking PowerReduction issue by mutating validators' power for accurate voting power recalibration and network integrity.",
)
.skippable();

pub const V0_2_1: MigrationDescriptor = MigrationDescriptor::at_height("0.2.1", 4_183_890, "gov module migration");

pub const V0_2_2: MigrationDescriptor = MigrationDescriptor::governance("0.2.2", "migration 0.2.2");

pub const V0_2_3: MigrationDescriptor = MigrationDescriptor::governance("0.2.3", "migration 0.2.3");

pub const V0_2_4: MigrationDescriptor = MigrationDescriptor::governance("0.2.4", "migration 0.2.4");

pub const V0_2_7: MigrationDescriptor = MigrationDescriptor::governance("0.2.7", "migration 0.2.7");

/// A compiled-in upgrade: when it fires and what it does beyond the module
/// migrations.
#[derive(Clone)]
pub struct Migration {
    pub descriptor: MigrationDescriptor,
    pub mutation: Option<MutationFn>,
}

impl Migration {
    pub const fn new(descriptor: MigrationDescriptor, mutation: Option<MutationFn>) -> Self {
        Self { descriptor, mutation }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

/// Every upgrade this binary knows, oldest first.
pub fn mainnet() -> Vec<Migration> {
    vec![
        Migration::new(V0_1_2, Some(power_index_mutation)),
        Migration::new(V0_2_1, None),
        Migration::new(V0_2_2, None),
        Migration::new(V0_2_3, None),
        Migration::new(V0_2_4, None),
        Migration::new(V0_2_7, None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_api::upgrade::Trigger;
    use std::collections::BTreeSet;

    #[test]
    fn test_mainnet_sequence() {
        let migrations = mainnet();
        let names: Vec<_> = migrations.iter().map(Migration::name).collect();
        assert_eq!(names, vec!["0.1.2", "0.2.1", "0.2.2", "0.2.3", "0.2.4", "0.2.7"]);
        assert_eq!(names.iter().collect::<BTreeSet<_>>().len(), names.len());

        assert_eq!(migrations[0].descriptor.trigger, Trigger::Height(16951));
        assert!(migrations[0].mutation.is_some());
        assert_eq!(migrations[1].descriptor.trigger_height(), Some(4_183_890));
        assert!(migrations[2..].iter().all(|m| m.descriptor.trigger == Trigger::Governance));
        assert!(migrations[1..].iter().all(|m| m.mutation.is_none()));
    }
}
