use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use gala_api::upgrade::Plan;
use gala_node::store::{self, ChainStore, StoreError};
use gala_node::upgrade::UpgradeInfoFile;
use gala_node::{App, AppBuilder};

use crate::config::NodeConfig;

#[derive(Parser)]
#[command(
    name = "galad",
    about = "Galactica node: height-gated upgrades and epoch inflation.",
    arg_required_else_help = true,
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short = 'c', long = "config", help = "Path to config file (overrides default)", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Writes genesis and commits height 0.
    Init {
        #[arg(long = "chain-id", help = "Chain id (defaults to node.chain_id)")]
        chain_id: Option<String>,

        #[arg(short = 'g', long = "genesis", help = "Existing genesis.json to initialise from")]
        genesis: Option<PathBuf>,

        #[arg(long = "genesis-time", help = "Genesis unix time (defaults to now)")]
        genesis_time: Option<u64>,
    },

    /// Runs the development block producer.
    Start {
        #[arg(short = 'n', long = "max-blocks", help = "Stop after this many blocks")]
        max_blocks: Option<u64>,

        #[arg(long = "schedule-upgrade", value_name = "NAME@HEIGHT", help = "Submit an upgrade plan in the first block")]
        schedule_upgrade: Option<String>,
    },

    #[command(subcommand)]
    Upgrade(UpgradeCommands),

    #[command(subcommand)]
    Query(QueryCommands),

    /// Dumps the current state as genesis JSON.
    ExportGenesis {
        #[arg(short = 'o', long = "output", help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum UpgradeCommands {
    /// Compiled-in upgrades and whether they ran.
    List {},
    /// Pending plan, on-disk upgrade info and module versions.
    Status {},
}

#[derive(Subcommand)]
pub enum QueryCommands {
    Inflation {},
    Epochs {},
    Validators {},
    Balance {
        #[arg(help = "Account address (hex)")]
        address: String,
    },
}

pub struct Context {
    pub config: Arc<NodeConfig>,
}

impl Context {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config.data_dir()
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.config.genesis_path()
    }

    pub fn chain_id(&self) -> &str {
        &self.config.node.chain_id
    }

    pub fn upgrade_info(&self) -> UpgradeInfoFile {
        UpgradeInfoFile::new(self.data_dir())
    }

    /// Opens the writable store; fails if another node holds the lock.
    pub fn open_app(&self) -> Result<App> {
        let app = AppBuilder::new(self.data_dir())
            .cache_size_mb(self.config.storage.rocksdb.cache_size_mb as usize)
            .build()?;
        Ok(app)
    }

    pub fn open_read_only(&self) -> Result<ChainStore> {
        match store::read_only(self.data_dir()) {
            Ok(store) => Ok(store),
            Err(StoreError::NotInitialized) => Err(anyhow!(
                "no chain data at {}, run `galad init` first",
                self.data_dir().display()
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parses `NAME@HEIGHT`.
pub fn parse_plan(value: &str) -> Result<Plan> {
    let (name, height) = value
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("expected NAME@HEIGHT, got '{value}'"))?;
    if name.trim().is_empty() {
        return Err(anyhow!("upgrade name cannot be empty"));
    }
    let height = height
        .parse::<u64>()
        .map_err(|e| anyhow!("invalid upgrade height '{height}': {e}"))?;
    Ok(Plan::new(name.trim(), height, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan("0.2.8@1200").unwrap();
        assert_eq!(plan, Plan::new("0.2.8", 1200, ""));
        assert!(parse_plan("0.2.8").is_err());
        assert!(parse_plan("@12").is_err());
        assert!(parse_plan("0.2.8@soon").is_err());
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::parse_from(["galad", "start", "-n", "5", "--schedule-upgrade", "v2@10"]);
        match cli.command {
            Commands::Start { max_blocks, schedule_upgrade } => {
                assert_eq!(max_blocks, Some(5));
                assert_eq!(schedule_upgrade.as_deref(), Some("v2@10"));
            }
            _ => panic!("expected start"),
        }

        let cli = Cli::parse_from(["galad", "-c", "/tmp/gala.toml", "query", "balance", "00"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gala.toml")));
        assert!(matches!(cli.command, Commands::Query(QueryCommands::Balance { .. })));
    }
}
