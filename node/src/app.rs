use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use gala_api::prelude::*;
use log::{error, info, warn};

use crate::bank::{GenesisBalance, StoreBank};
use crate::epochs::EpochsKeeper;
use crate::error::NodeError;
use crate::genesis::{BankGenesis, GenesisState, StakingGenesis, UpgradeGenesis};
use crate::inflation::{self, InflationHooks, InflationKeeper};
use crate::metrics::{inc_upgrade_failures, inc_upgrades_applied, observe_block_processing, set_block_height};
use crate::staking::StakingKeeper;
use crate::store::{
    self, BankOps, BlockContext, BlockHeader, ChainStore, CommitInfo, EpochOps, MetaOps, StakingOps,
    StoreError, UpgradeOps, CHAIN_STORE_DEFAULT_CACHE_MB,
};
use crate::upgrade::{
    self, Coordinator, HandlerRegistry, Migration, ModuleManager, PlanQueue, ReconcileOutcome,
    RegistryBuilder, UpgradeEnv, UpgradeError, UpgradeInfoFile,
};

/// Collaborators shared by the block logic and the upgrade handlers.
#[derive(Clone, Debug, Default)]
pub struct Keepers {
    pub bank: StoreBank,
    pub staking: StakingKeeper,
}

/// Transactions this core understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    ScheduleUpgrade(Plan),
    CancelUpgrade,
}

#[derive(Clone, Debug)]
pub struct BlockResult {
    pub commit: CommitInfo,
    pub events: Vec<Event>,
    pub validator_updates: Vec<ValidatorUpdate>,
    /// Upgrade that ran in this block.
    pub upgrade: Option<String>,
}

pub struct AppBuilder {
    data_dir: PathBuf,
    cache_size_mb: usize,
    migrations: Vec<Migration>,
    modules: ModuleManager,
    max_validators: u32,
}

impl AppBuilder {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_size_mb: CHAIN_STORE_DEFAULT_CACHE_MB,
            migrations: upgrade::mainnet(),
            modules: ModuleManager::galactica(),
            max_validators: DEFAULT_MAX_VALIDATORS,
        }
    }

    pub fn cache_size_mb(mut self, cache_size_mb: usize) -> Self {
        self.cache_size_mb = cache_size_mb;
        self
    }

    pub fn migrations(mut self, migrations: Vec<Migration>) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn modules(mut self, modules: ModuleManager) -> Self {
        self.modules = modules;
        self
    }

    pub fn max_validators(mut self, max_validators: u32) -> Self {
        self.max_validators = max_validators;
        self
    }

    /// Opens the store and wires every compiled-in upgrade.
    pub fn build(self) -> Result<App, NodeError> {
        let store = store::primary(&self.data_dir, self.cache_size_mb)?;
        let upgrade_info = UpgradeInfoFile::new(&self.data_dir);

        let mut registry = RegistryBuilder::new();
        let (outcomes, queue) = Coordinator::new(&store).reconcile_all(&self.migrations, &mut registry);

        let keepers = Keepers {
            bank: StoreBank::default(),
            staking: StakingKeeper::new(self.max_validators),
        };
        let hooks = InflationHooks::new(InflationKeeper::new(keepers.bank.clone()));
        let epochs = EpochsKeeper::new().with_hooks(Arc::new(hooks));

        Ok(App {
            store,
            registry: registry.build(),
            migrations: self.migrations,
            modules: self.modules,
            keepers,
            epochs,
            upgrade_info,
            queue,
            outcomes,
        })
    }
}

/// The replicated state machine: one call per block, in height order.
pub struct App {
    store: ChainStore,
    registry: HandlerRegistry,
    migrations: Vec<Migration>,
    modules: ModuleManager,
    keepers: Keepers,
    epochs: EpochsKeeper,
    upgrade_info: UpgradeInfoFile,
    queue: PlanQueue,
    outcomes: Vec<(String, ReconcileOutcome)>,
}

enum DueUpgrade {
    Ran(Plan),
    AlreadyDone(String),
    Superseded(String),
}

impl App {
    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn keepers(&self) -> &Keepers {
        &self.keepers
    }

    pub fn pending_upgrades(&self) -> &PlanQueue {
        &self.queue
    }

    pub fn reconcile_outcomes(&self) -> &[(String, ReconcileOutcome)] {
        &self.outcomes
    }

    pub fn upgrade_info(&self) -> &UpgradeInfoFile {
        &self.upgrade_info
    }

    pub fn latest_height(&self) -> Result<Option<u64>, NodeError> {
        Ok(self.store.get_latest_height()?)
    }

    /// Recomputes the pending schedule from committed state. The registry
    /// built at startup is kept as is.
    fn reschedule(&mut self) {
        let (outcomes, queue) =
            Coordinator::new(&self.store).reconcile_all(&self.migrations, &mut RegistryBuilder::new());
        self.outcomes = outcomes;
        self.queue = queue;
    }

    /// Writes the genesis state as block 0.
    pub fn init_chain(&mut self, genesis: &GenesisState) -> Result<CommitInfo, NodeError> {
        if let Some(height) = self.latest_height()? {
            return Err(NodeError::AlreadyInitialized(height));
        }
        genesis.validate()?;

        let mut ctx = BlockContext::new(&self.store, BlockHeader::new(0, genesis.genesis_time));
        inflation::init_genesis(&mut ctx, &genesis.inflation)?;
        self.epochs.init_genesis(&mut ctx, &genesis.epochs)?;
        self.keepers.bank.init_genesis(&mut ctx, &genesis.bank.balances)?;
        for validator in &genesis.staking.validators {
            self.keepers.staking.set_validator(&mut ctx, validator)?;
        }
        let updates = self.keepers.staking.apply_and_return_validator_set_updates(&mut ctx)?;
        ctx.add_validator_updates(updates);

        for (name, applied) in &genesis.upgrade.applied {
            ctx.set_done(name, applied)?;
        }
        let versions = if genesis.upgrade.module_versions.is_empty() {
            self.modules.current_version_map()
        } else {
            genesis.upgrade.module_versions.clone()
        };
        ctx.set_module_version_map(&versions)?;

        let commit = ctx.commit()?;
        info!(
            "chain {} initialised, app hash {}",
            genesis.chain_id,
            commit.app_hash_hex()
        );
        set_block_height(0);
        self.reschedule();
        Ok(commit)
    }

    /// Executes and commits one block. On error nothing of the block is
    /// written.
    pub fn process_block(&mut self, header: BlockHeader, msgs: &[Msg]) -> Result<BlockResult, NodeError> {
        let started = Instant::now();
        let latest = self.latest_height()?.ok_or(NodeError::NotInitialized)?;
        if header.height != latest + 1 {
            return Err(NodeError::UnexpectedHeight {
                expected: latest + 1,
                got: header.height,
            });
        }

        let mut ctx = BlockContext::new(&self.store, header);
        let upgrade = self.apply_due_upgrade(&mut ctx)?;

        self.epochs.begin_block(&mut ctx)?;

        for msg in msgs {
            if let Err(e) = self.deliver(&mut ctx, msg) {
                warn!("rejected {msg:?} at height {}: {e}", header.height);
            }
        }

        let updates = self.keepers.staking.apply_and_return_validator_set_updates(&mut ctx)?;
        ctx.add_validator_updates(updates);

        let (commit, events, validator_updates) = ctx.commit_with_output()?;

        let upgrade = match upgrade {
            Some(DueUpgrade::Ran(plan)) => {
                inc_upgrades_applied(&plan.name);
                self.queue.complete(&plan.name, header.height);
                if let Err(e) = self.upgrade_info.dump(header.height, &plan) {
                    error!("failed to dump upgrade info for {}: {e}", plan.name);
                }
                Some(plan.name)
            }
            Some(DueUpgrade::AlreadyDone(name)) | Some(DueUpgrade::Superseded(name)) => {
                self.queue.complete(&name, header.height);
                None
            }
            None => None,
        };

        set_block_height(header.height);
        observe_block_processing(started.elapsed().as_secs_f64());
        Ok(BlockResult {
            commit,
            events,
            validator_updates,
            upgrade,
        })
    }

    fn sequence_index(&self, name: &str) -> Option<usize> {
        self.migrations.iter().position(|migration| migration.name() == name)
    }

    /// Whether a migration later in the sequence than `index` already ran.
    fn later_applied(&self, ctx: &BlockContext<'_>, index: usize) -> Result<Option<&str>, StoreError> {
        for later in &self.migrations[index + 1..] {
            if ctx.get_done(later.name())?.is_some() {
                return Ok(Some(later.name()));
            }
        }
        Ok(None)
    }

    /// Height gate and version order for a compiled-in upgrade about to run
    /// at `height`. Names this binary does not know are unconstrained.
    fn check_sequence(&self, ctx: &BlockContext<'_>, name: &str, height: u64) -> Result<(), UpgradeError> {
        let Some(index) = self.sequence_index(name) else {
            return Ok(());
        };
        if let Some(trigger) = self.migrations[index].descriptor.trigger_height() {
            if height < trigger {
                return Err(UpgradeError::BelowTrigger {
                    name: name.to_string(),
                    height,
                    trigger,
                });
            }
        }
        for earlier in &self.migrations[..index] {
            if !earlier.descriptor.skippable && ctx.get_done(earlier.name())?.is_none() {
                return Err(UpgradeError::OutOfOrder {
                    name: name.to_string(),
                    other: earlier.name().to_string(),
                });
            }
        }
        if let Some(later) = self.later_applied(ctx, index)? {
            return Err(UpgradeError::OutOfOrder {
                name: name.to_string(),
                other: later.to_string(),
            });
        }
        Ok(())
    }

    /// Rejects a governance plan that could only run below its trigger or
    /// ahead of an earlier upgrade.
    fn check_schedule(&self, ctx: &BlockContext<'_>, plan: &Plan) -> Result<(), UpgradeError> {
        let Some(index) = self.sequence_index(&plan.name) else {
            return Ok(());
        };
        if let Some(trigger) = self.migrations[index].descriptor.trigger_height() {
            if plan.height < trigger {
                return Err(UpgradeError::InvalidPlan(format!(
                    "{} cannot run before its trigger height {trigger}",
                    plan.name
                )));
            }
        }
        for earlier in &self.migrations[..index] {
            if earlier.descriptor.skippable || ctx.get_done(earlier.name())?.is_some() {
                continue;
            }
            let runs_at = self
                .queue
                .iter()
                .find(|queued| queued.name == earlier.name())
                .map(|queued| queued.height);
            match runs_at {
                Some(runs_at) if runs_at < plan.height => {}
                _ => {
                    return Err(UpgradeError::InvalidPlan(format!(
                        "{} must be applied before {}",
                        earlier.name(),
                        plan.name
                    )))
                }
            }
        }
        if let Some(later) = self.later_applied(ctx, index)? {
            return Err(UpgradeError::InvalidPlan(format!(
                "{} was already superseded by {later}",
                plan.name
            )));
        }
        Ok(())
    }

    /// The plan stored on chain takes precedence over the compiled-in
    /// schedule, unless the queue holds an earlier upgrade of the sequence.
    /// At most one upgrade runs per block.
    fn apply_due_upgrade(&self, ctx: &mut BlockContext<'_>) -> Result<Option<DueUpgrade>, NodeError> {
        let height = ctx.height();
        let stored = ctx.get_plan()?.filter(|plan| plan.height <= height);
        let queued = self.queue.due(height).cloned();

        let queued_first = match (&stored, &queued) {
            (Some(stored), Some(queued)) => matches!(
                (self.sequence_index(&queued.name), self.sequence_index(&stored.name)),
                (Some(q), Some(s)) if q < s
            ),
            _ => false,
        };
        let (plan, from_store) = match (stored, queued) {
            (Some(stored), _) if !queued_first => (stored, true),
            (_, Some(queued)) => (queued, false),
            _ => return Ok(None),
        };

        if ctx.get_done(&plan.name)?.is_some() {
            warn!("upgrade {} is due at {height} but was already applied", plan.name);
            if from_store {
                ctx.clear_plan();
            }
            return Ok(Some(DueUpgrade::AlreadyDone(plan.name)));
        }

        if let Some(index) = self.sequence_index(&plan.name) {
            if self.migrations[index].descriptor.skippable {
                if let Some(later) = self.later_applied(ctx, index)? {
                    info!("upgrade {} skipped, {later} already applied", plan.name);
                    if from_store {
                        ctx.clear_plan();
                    }
                    return Ok(Some(DueUpgrade::Superseded(plan.name)));
                }
            }
        }

        if let Err(e) = self.check_sequence(ctx, &plan.name, height) {
            inc_upgrade_failures();
            error!("refusing upgrade {} at height {height}: {e}", plan.name);
            return Err(e.into());
        }

        let Some(handler) = self.registry.get(&plan.name) else {
            inc_upgrade_failures();
            if let Err(e) = self.upgrade_info.dump(height, &plan) {
                error!("failed to dump upgrade info: {e}");
            }
            error!(
                "UPGRADE \"{}\" NEEDED at height {height}: {}",
                plan.name, plan.info
            );
            return Err(UpgradeError::UpgradeNeeded {
                name: plan.name,
                height,
            }
            .into());
        };

        let from = ctx.get_module_version_map()?;
        let env = UpgradeEnv {
            modules: &self.modules,
            keepers: &self.keepers,
        };
        let to = handler.handle(ctx, &plan, from, &env).map_err(|e| {
            inc_upgrade_failures();
            error!("upgrade {} failed at height {height}: {e}", plan.name);
            e
        })?;

        ctx.set_module_version_map(&to)?;
        ctx.set_done(
            &plan.name,
            &AppliedUpgrade {
                height,
                info: plan.info.clone(),
            },
        )?;
        if from_store {
            ctx.clear_plan();
        }
        ctx.emit(
            Event::new(EVENT_TYPE_UPGRADE)
                .attr(ATTRIBUTE_NAME, &plan.name)
                .attr(ATTRIBUTE_HEIGHT, height),
        );
        info!("upgrade {} applied at height {height}", plan.name);
        Ok(Some(DueUpgrade::Ran(plan)))
    }

    fn deliver(&self, ctx: &mut BlockContext<'_>, msg: &Msg) -> Result<(), UpgradeError> {
        match msg {
            Msg::ScheduleUpgrade(plan) => {
                if plan.name.trim().is_empty() {
                    return Err(UpgradeError::InvalidPlan("name cannot be empty".to_string()));
                }
                if plan.height <= ctx.height() {
                    return Err(UpgradeError::InvalidPlan(format!(
                        "height {} is not in the future",
                        plan.height
                    )));
                }
                if ctx.get_done(&plan.name)?.is_some() {
                    return Err(UpgradeError::AlreadyApplied(plan.name.clone()));
                }
                self.check_schedule(ctx, plan)?;
                ctx.set_plan(plan)?;
                info!("upgrade {} scheduled at height {}", plan.name, plan.height);
            }
            Msg::CancelUpgrade => {
                if let Some(plan) = ctx.get_plan()? {
                    ctx.clear_plan();
                    info!("upgrade {} cancelled", plan.name);
                }
            }
        }
        Ok(())
    }

    /// Current state in genesis form.
    pub fn export_genesis(&self, chain_id: &str) -> Result<GenesisState, NodeError> {
        let store = &self.store;
        if !store.is_initialized()? {
            return Err(NodeError::NotInitialized);
        }

        let mut balances: BTreeMap<Address, Vec<Coin>> = BTreeMap::new();
        for (address, coin) in store.get_every_balance()? {
            balances.entry(address).or_default().push(coin);
        }

        Ok(GenesisState {
            chain_id: chain_id.to_string(),
            genesis_time: store.get_last_block_time()?.unwrap_or_default(),
            inflation: inflation::export_genesis(store)?,
            epochs: store.get_all_epoch_infos()?,
            bank: BankGenesis {
                balances: balances
                    .into_iter()
                    .map(|(address, coins)| GenesisBalance { address, coins })
                    .collect(),
            },
            staking: StakingGenesis {
                validators: store.get_all_validators()?,
            },
            upgrade: UpgradeGenesis {
                applied: store.get_all_done()?,
                module_versions: store.get_module_version_map()?,
            },
        })
    }
}
