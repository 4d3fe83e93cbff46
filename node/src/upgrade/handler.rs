use gala_api::upgrade::{Plan, VersionMap};
use log::{info, warn};

use crate::app::Keepers;
use crate::store::BlockContext;
use crate::upgrade::{Migration, ModuleManager, MutationFn, UpgradeError, UpgradeHandler};

/// What a handler may touch besides the block context.
pub struct UpgradeEnv<'a> {
    pub modules: &'a ModuleManager,
    pub keepers: &'a Keepers,
}

/// Runs an optional mutation then the module migrations, always in that
/// order.
pub struct MigrationHandler {
    name: String,
    mutation: Option<MutationFn>,
}

impl MigrationHandler {
    pub fn new(name: impl Into<String>, mutation: Option<MutationFn>) -> Self {
        Self {
            name: name.into(),
            mutation,
        }
    }
}

impl From<&Migration> for MigrationHandler {
    fn from(migration: &Migration) -> Self {
        Self::new(migration.name(), migration.mutation)
    }
}

impl UpgradeHandler for MigrationHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(
        &self,
        ctx: &mut BlockContext<'_>,
        plan: &Plan,
        from: VersionMap,
        env: &UpgradeEnv<'_>,
    ) -> Result<VersionMap, UpgradeError> {
        match self.mutation {
            Some(_) if plan.name != self.name => {
                warn!(
                    "handler {} invoked for plan {}, skipping its state mutation",
                    self.name, plan.name
                );
            }
            Some(mutation) => {
                info!("applying upgrade {} at height {}", plan.name, ctx.height());
                mutation(ctx, env).map_err(|e| match e {
                    UpgradeError::Store(e) => UpgradeError::mutation(&self.name, e),
                    other => other,
                })?;
            }
            None => {}
        }

        env.modules.run_migrations(ctx, &from)
    }
}
