use std::collections::VecDeque;
use std::sync::Arc;

use gala_api::upgrade::{Plan, Trigger};
use log::{info, warn};

use crate::store::{ChainStore, MetaOps, UpgradeOps};
use crate::upgrade::{Migration, MigrationHandler, RegistryBuilder};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Ran before; the handler is registered but will not be scheduled.
    AlreadyApplied { height: u64 },
    /// Height triggered and pending.
    Scheduled(Plan),
    /// Waits for an on-chain plan with this name.
    Registered,
    /// A later upgrade already ran.
    Skipped { superseded_by: String },
}

/// Startup-time wiring of the compiled-in upgrades.
///
/// Reads only committed state, so running it again after a restart yields
/// the same registry and the same schedule. Anything it cannot read counts
/// as "not applied yet". The on-disk upgrade info is never taken as proof
/// of application: it is also written when the node halts for a missing
/// handler.
pub struct Coordinator<'a> {
    store: &'a ChainStore,
}

impl<'a> Coordinator<'a> {
    pub fn new(store: &'a ChainStore) -> Self {
        Self { store }
    }

    fn current_height(&self) -> u64 {
        match self.store.get_latest_height() {
            Ok(height) => height.unwrap_or_default(),
            Err(e) => {
                warn!("could not read latest height, assuming genesis: {e}");
                0
            }
        }
    }

    /// Height at which `migration` was applied, from its store record.
    pub fn applied_height(&self, migration: &Migration) -> Option<u64> {
        let name = migration.name();
        match self.store.get_done(name) {
            Ok(done) => done.map(|applied| applied.height),
            Err(e) => {
                warn!("could not read applied record for {name}, treating as not applied: {e}");
                None
            }
        }
    }

    fn is_applied(&self, migration: &Migration) -> Option<u64> {
        let height = self.applied_height(migration)?;
        match migration.descriptor.trigger {
            Trigger::Height(trigger) if height < trigger => {
                warn!(
                    "upgrade {} recorded at {height}, before its trigger {trigger}; treating as not applied",
                    migration.name()
                );
                None
            }
            _ => Some(height),
        }
    }

    /// Registers the handler for `migration` and decides whether it still
    /// has to run.
    pub fn reconcile(&self, migration: &Migration, registry: &mut RegistryBuilder) -> ReconcileOutcome {
        self.reconcile_with(migration, registry, None)
    }

    fn reconcile_with(
        &self,
        migration: &Migration,
        registry: &mut RegistryBuilder,
        superseded_by: Option<&str>,
    ) -> ReconcileOutcome {
        registry.register(Arc::new(MigrationHandler::from(migration)));

        if let Some(height) = self.is_applied(migration) {
            return ReconcileOutcome::AlreadyApplied { height };
        }
        if let (true, Some(later)) = (migration.descriptor.skippable, superseded_by) {
            return ReconcileOutcome::Skipped {
                superseded_by: later.to_string(),
            };
        }
        match migration.descriptor.plan_at(self.current_height()) {
            Some(plan) => ReconcileOutcome::Scheduled(plan),
            None => ReconcileOutcome::Registered,
        }
    }

    /// Reconciles every migration in order and returns the outcomes with
    /// the pending height-triggered plans, earliest first.
    pub fn reconcile_all(
        &self,
        migrations: &[Migration],
        registry: &mut RegistryBuilder,
    ) -> (Vec<(String, ReconcileOutcome)>, PlanQueue) {
        let mut outcomes = Vec::with_capacity(migrations.len());
        let mut queue = PlanQueue::default();

        for (index, migration) in migrations.iter().enumerate() {
            let superseded_by = migrations[index + 1..]
                .iter()
                .find(|later| self.is_applied(later).is_some())
                .map(Migration::name);
            let outcome = self.reconcile_with(migration, registry, superseded_by);
            match &outcome {
                ReconcileOutcome::Scheduled(plan) => {
                    info!("upgrade {} scheduled at height {}", plan.name, plan.height);
                    queue.push(plan.clone());
                }
                ReconcileOutcome::AlreadyApplied { height } => {
                    info!("upgrade {} already applied at height {height}", migration.name());
                }
                ReconcileOutcome::Skipped { superseded_by } => {
                    info!("upgrade {} skipped, {superseded_by} already applied", migration.name());
                }
                ReconcileOutcome::Registered => {}
            }
            outcomes.push((migration.name().to_string(), outcome));
        }

        (outcomes, queue)
    }
}

/// Height-triggered plans waiting to run. At most one becomes due per block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanQueue {
    plans: VecDeque<Plan>,
}

impl PlanQueue {
    pub fn push(&mut self, plan: Plan) {
        self.plans.push_back(plan);
    }

    pub fn head(&self) -> Option<&Plan> {
        self.plans.front()
    }

    /// The head plan if it is due at `height`.
    pub fn due(&self, height: u64) -> Option<&Plan> {
        self.head().filter(|plan| plan.height <= height)
    }

    /// Drops `name` after it ran at `height`. A follower that became due at
    /// the same height moves to the next block.
    pub fn complete(&mut self, name: &str, height: u64) {
        self.plans.retain(|plan| plan.name != name);
        if let Some(next) = self.plans.front_mut() {
            next.height = next.height.max(height + 1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
