mod cli;
mod commands;
mod config;
mod log;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, Context};
use commands::{genesis, node, query, upgrade};
use env_logger::{self, Env};

use crate::config::{NodeConfig, NodeConfigError};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli);

    env_logger::Builder::from_env(Env::default().default_filter_or(config.logging.log_level.filter())).init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()?;

    rt.block_on(run_galad(cli, config))
}

fn load_config(cli: &Cli) -> NodeConfig {
    match NodeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => match e {
            NodeConfigError::ConfigFileNotFound => {
                log::print_info("config.toml not found, creating default configuration...");
                match NodeConfig::create_default() {
                    Ok(config) => {
                        log::print_info("✓ Default configuration created successfully");
                        config
                    }
                    Err(creation_error) => {
                        log::print_error(&format!("{creation_error}"));
                        std::process::exit(1);
                    }
                }
            }

            NodeConfigError::CustomConfigFileNotFound(path) => {
                log::print_error(&format!("Custom config file not found: {path}"));
                log::print_info("Please check the path and try again.");
                std::process::exit(1);
            }

            NodeConfigError::InvalidValue(msg) => {
                log::print_error(&format!("Configuration Error: {msg}"));
                log::print_info("Please fix the value in your config.toml file and try again.");
                std::process::exit(1);
            }

            NodeConfigError::FileReadError(io_err) => {
                log::print_error(&format!("Could not read config file: {io_err}"));
                std::process::exit(1);
            }

            NodeConfigError::ParseError(parse_err) => {
                log::print_error(&format!("Invalid config.toml format: {parse_err}"));
                log::print_info("Please check your config.toml file syntax.");
                std::process::exit(1);
            }

            NodeConfigError::HomeDirectoryNotFound => {
                log::print_error("Could not determine home directory");
                std::process::exit(1);
            }

            NodeConfigError::DefaultConfigCreationFailed(msg) => {
                log::print_error(&format!("Failed to create default config: {msg}"));
                std::process::exit(1);
            }
        },
    }
}

async fn run_galad(cli: Cli, config: NodeConfig) -> Result<()> {
    log::print_title(&format!("✦ GALACTICA {}", env!("CARGO_PKG_VERSION")));
    log::print_message(&format!("Chain {} · data at {}", config.node.chain_id, config.data_dir().display()));

    let context = Context::new(config);

    match cli.command {
        Commands::Init { chain_id, genesis, genesis_time } => {
            node::handle_init(&context, chain_id, genesis, genesis_time)?;
        }
        Commands::Start { max_blocks, schedule_upgrade } => {
            node::handle_start(context, max_blocks, schedule_upgrade).await?;
        }
        Commands::Upgrade(command) => {
            upgrade::handle_upgrade_command(&context, command)?;
        }
        Commands::Query(command) => {
            query::handle_query_command(&context, command)?;
        }
        Commands::ExportGenesis { output } => {
            genesis::handle_export_genesis(&context, output)?;
        }
    }

    Ok(())
}
