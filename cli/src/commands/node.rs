use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;

use gala_node::metrics::run_metrics_server;
use gala_node::store::{BlockHeader, MetaOps};
use gala_node::upgrade::ReconcileOutcome;
use gala_node::utils::{wait_for_shutdown, Shutdown};
use gala_node::{App, GenesisState, Msg};

use crate::cli::{parse_plan, Context};
use crate::log;

pub fn handle_init(
    context: &Context,
    chain_id: Option<String>,
    genesis: Option<PathBuf>,
    genesis_time: Option<u64>,
) -> Result<()> {
    let genesis_path = context.genesis_path();
    let state = match genesis {
        Some(path) => GenesisState::load(&path)?,
        None if genesis_path.exists() => GenesisState::load(&genesis_path)?,
        None => {
            let chain_id = chain_id.unwrap_or_else(|| context.chain_id().to_string());
            let time = genesis_time.unwrap_or_else(unix_now);
            GenesisState::new(chain_id, time)
        }
    };

    if !genesis_path.exists() {
        if let Some(parent) = genesis_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        state.save(&genesis_path)?;
        log::print_info(&format!("Genesis written to {}", genesis_path.display()));
    }

    let mut app = context.open_app()?;
    let commit = app.init_chain(&state)?;

    log::print_section_header("Chain initialised");
    log::print_message(&format!("Chain id:   {}", state.chain_id));
    log::print_message(&format!("Height:     {}", commit.height));
    log::print_message(&format!("App hash:   {}", commit.app_hash_hex()));
    log::print_message(&format!("Validators: {}", state.staking.validators.len()));
    Ok(())
}

pub async fn handle_start(context: Context, max_blocks: Option<u64>, schedule_upgrade: Option<String>) -> Result<()> {
    let app = context.open_app()?;
    let height = app
        .latest_height()?
        .ok_or_else(|| anyhow!("chain not initialised, run `galad init` first"))?;

    print_reconcile_outcomes(&app);

    let msgs = match schedule_upgrade {
        Some(value) => vec![Msg::ScheduleUpgrade(parse_plan(&value)?)],
        None => Vec::new(),
    };
    let max_blocks = max_blocks.or(context.config.consensus.max_blocks);
    let interval = Duration::from_millis(context.config.consensus.block_interval_ms);

    log::print_section_header("Block production");
    log::print_message(&format!("Resuming after height {height}"));

    let (stop, shutdown) = Shutdown::channel();
    let mut tasks = JoinSet::new();

    if context.config.metrics.enabled {
        let port = context.config.metrics.port;
        let mut metrics_shutdown = shutdown.clone();
        tasks.spawn(async move {
            tokio::select! {
                result = run_metrics_server(port) => result,
                _ = metrics_shutdown.requested() => Ok(()),
            }
        });
    }

    let producer = BlockProducer {
        app,
        interval,
        max_blocks,
        pending: msgs,
        shutdown,
    };
    tasks.spawn_blocking(move || producer.run());

    wait_for_shutdown(tasks, stop).await
}

fn print_reconcile_outcomes(app: &App) {
    log::print_section_header("Upgrades");
    for (name, outcome) in app.reconcile_outcomes() {
        let line = match outcome {
            ReconcileOutcome::AlreadyApplied { height } => format!("{name:<8} applied at {height}"),
            ReconcileOutcome::Scheduled(plan) => format!("{name:<8} scheduled for {}", plan.height),
            ReconcileOutcome::Registered => format!("{name:<8} awaiting on-chain plan"),
            ReconcileOutcome::Skipped { superseded_by } => format!("{name:<8} skipped ({superseded_by} applied)"),
        };
        log::print_message(&line);
    }
}

/// Single-node stand-in for consensus: proposes one block per interval
/// using wall-clock time, never earlier than the last committed block.
struct BlockProducer {
    app: App,
    interval: Duration,
    max_blocks: Option<u64>,
    pending: Vec<Msg>,
    shutdown: Shutdown,
}

impl BlockProducer {
    fn run(mut self) -> Result<()> {
        let mut produced = 0u64;

        while !self.shutdown.is_requested() {
            if self.max_blocks.is_some_and(|max| produced >= max) {
                info!("produced {produced} blocks, stopping");
                break;
            }

            let height = self.app.latest_height()?.unwrap_or_default() + 1;
            let last_time = self.app.store().get_last_block_time()?.unwrap_or_default();
            let time = unix_now().max(last_time);
            let msgs = std::mem::take(&mut self.pending);

            match self.app.process_block(BlockHeader::new(height, time), &msgs) {
                Ok(result) => {
                    info!(
                        "committed height {} app_hash={} events={} validator_updates={}",
                        result.commit.height,
                        result.commit.app_hash_hex(),
                        result.events.len(),
                        result.validator_updates.len()
                    );
                    if let Some(name) = result.upgrade {
                        log::print_success(&format!("Upgrade {name} applied at height {height}"));
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!("halting at height {height}: {e}");
                    return Err(e.into());
                }
                Err(e) => warn!("block {height} rejected: {e}"),
            }

            produced += 1;
            std::thread::sleep(self.interval);
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
