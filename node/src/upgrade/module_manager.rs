use std::collections::BTreeMap;

use gala_api::prelude::*;
use log::info;

use crate::inflation::migrate_v1_to_v2;
use crate::store::{BlockContext, StoreError};
use crate::upgrade::UpgradeError;

/// Moves one module's state from version `n` to `n + 1`.
pub type MigrationStep = fn(&mut BlockContext<'_>) -> Result<(), StoreError>;

#[derive(Clone, Default)]
struct Module {
    consensus_version: u64,
    steps: BTreeMap<u64, MigrationStep>,
}

/// Consensus versions of every module and the steps between them.
#[derive(Clone, Default)]
pub struct ModuleManager {
    modules: BTreeMap<String, Module>,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The modules of this chain at their current versions.
    pub fn galactica() -> Self {
        Self::new()
            .with_module(BANK_MODULE, 1)
            .with_module(STAKING_MODULE, 1)
            .with_module(EPOCHS_MODULE, 1)
            .with_module(UPGRADE_MODULE, 1)
            .with_module(INFLATION_MODULE, 2)
            .with_migration(INFLATION_MODULE, 1, migrate_v1_to_v2)
    }

    pub fn with_module(mut self, name: &str, consensus_version: u64) -> Self {
        self.modules.entry(name.to_string()).or_default().consensus_version = consensus_version;
        self
    }

    pub fn with_migration(mut self, name: &str, from_version: u64, step: MigrationStep) -> Self {
        self.modules
            .entry(name.to_string())
            .or_default()
            .steps
            .insert(from_version, step);
        self
    }

    pub fn current_version_map(&self) -> VersionMap {
        self.modules
            .iter()
            .map(|(name, module)| (name.clone(), module.consensus_version))
            .collect()
    }

    /// Brings every module from its version in `from` up to its current
    /// version and returns the resulting map. Modules absent from `from`
    /// are recorded at their current version without running any step.
    pub fn run_migrations(&self, ctx: &mut BlockContext<'_>, from: &VersionMap) -> Result<VersionMap, UpgradeError> {
        let mut to = VersionMap::new();

        for (name, module) in &self.modules {
            let current = module.consensus_version;
            let Some(&from_version) = from.get(name) else {
                info!("module {name} added at version {current}");
                to.insert(name.clone(), current);
                continue;
            };

            if from_version > current {
                return Err(UpgradeError::Downgrade {
                    module: name.clone(),
                    from: from_version,
                    to: current,
                });
            }

            for version in from_version..current {
                let step = module.steps.get(&version).ok_or_else(|| UpgradeError::MissingMigration {
                    module: name.clone(),
                    from: version,
                    to: version + 1,
                })?;
                step(ctx)?;
                info!("migrated module {name} from version {version} to {}", version + 1);
                ctx.emit(
                    Event::new(EVENT_TYPE_MODULE_MIGRATION)
                        .attr(ATTRIBUTE_MODULE, name)
                        .attr(ATTRIBUTE_FROM_VERSION, version)
                        .attr(ATTRIBUTE_TO_VERSION, version + 1),
                );
            }
            to.insert(name.clone(), current);
        }

        Ok(to)
    }
}
