use anyhow::{anyhow, Result};
use std::str::FromStr;

use gala_api::prelude::*;
use gala_node::inflation;
use gala_node::store::{BankOps, EpochOps, StakingOps};

use crate::cli::{Context, QueryCommands};
use crate::log;

pub fn handle_query_command(context: &Context, command: QueryCommands) -> Result<()> {
    let store = context.open_read_only()?;

    match command {
        QueryCommands::Inflation {} => {
            let state = inflation::export_genesis(&store)?;
            let provision = calculate_epoch_mint_provision(
                &state.period_mint_provisions,
                state.period,
                state.epochs_per_period,
            )?;

            log::print_section_header("Inflation");
            log::print_message(&format!("Enabled:            {}", state.params.enable_inflation));
            log::print_message(&format!("Mint denom:         {}", state.params.mint_denom));
            log::print_message(&format!("Epoch identifier:   {}", state.epoch_identifier));
            log::print_message(&format!("Period:             {}", state.period));
            log::print_message(&format!("Epochs per period:  {}", state.epochs_per_period));
            log::print_message(&format!("Skipped epochs:     {}", state.skipped_epochs));
            log::print_message(&format!("Epoch provision:    {provision}"));
            log::print_message(&format!("Supply:             {}", store.get_supply(&state.params.mint_denom)?));

            log::print_divider();
            let distribution = &state.inflation_distribution;
            log::print_message(&format!("validators  {}", distribution.validators_share));
            for share in &distribution.other_shares {
                log::print_message(&format!("{:<11} {} -> {}", share.name, share.share, share.address));
            }
        }

        QueryCommands::Epochs {} => {
            log::print_section_header("Epochs");
            for info in store.get_all_epoch_infos()? {
                let status = if info.epoch_counting_started {
                    format!(
                        "#{} since {} (height {})",
                        info.current_epoch, info.current_epoch_start_time, info.current_epoch_start_height
                    )
                } else {
                    format!("starts at {}", info.start_time)
                };
                log::print_message(&format!("{:<6} every {:>7}s  {status}", info.identifier, info.duration));
            }
        }

        QueryCommands::Validators {} => {
            let mut validators = store.get_all_validators()?;
            validators.sort_by(|a, b| b.tokens.cmp(&a.tokens));

            log::print_section_header("Validators");
            for validator in validators {
                let jailed = if validator.jailed { " jailed" } else { "" };
                log::print_message(&format!(
                    "{} power={:<10} {:?}{jailed}",
                    validator.operator,
                    validator.consensus_power(),
                    validator.status
                ));
            }
        }

        QueryCommands::Balance { address } => {
            let address = Address::from_str(&address).map_err(|e| anyhow!("invalid address: {e}"))?;

            log::print_section_header(&format!("Balance of {address}"));
            let coins = store.get_all_balances(&address)?;
            if coins.is_empty() {
                log::print_message("(empty)");
            }
            for coin in coins {
                log::print_message(&coin.to_string());
            }
        }
    }
    Ok(())
}
