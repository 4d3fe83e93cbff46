use anyhow::Result;

use gala_api::upgrade::Trigger;
use gala_node::store::{MetaOps, UpgradeOps};
use gala_node::upgrade::{mainnet, ModuleManager};

use crate::cli::{Context, UpgradeCommands};
use crate::log;

pub fn handle_upgrade_command(context: &Context, command: UpgradeCommands) -> Result<()> {
    match command {
        UpgradeCommands::List {} => list_upgrades(context),
        UpgradeCommands::Status {} => upgrade_status(context),
    }
}

fn list_upgrades(context: &Context) -> Result<()> {
    let store = context.open_read_only()?;

    log::print_section_header("Compiled upgrades");
    for migration in mainnet() {
        let descriptor = &migration.descriptor;
        let trigger = match descriptor.trigger {
            Trigger::Height(height) => format!("height {height}"),
            Trigger::Governance => "governance".to_string(),
        };
        let state = match store.get_done(descriptor.name)? {
            Some(applied) => format!("applied at {}", applied.height),
            None => "pending".to_string(),
        };
        let skippable = if descriptor.skippable { " (skippable)" } else { "" };
        log::print_message(&format!("{:<8} {:<16} {state}{skippable}", descriptor.name, trigger));
    }
    Ok(())
}

fn upgrade_status(context: &Context) -> Result<()> {
    let store = context.open_read_only()?;

    log::print_section_header("Upgrade status");
    match store.get_latest_height()? {
        Some(height) => log::print_message(&format!("Latest height:  {height}")),
        None => log::print_message("Latest height:  (not initialised)"),
    }
    match store.get_plan()? {
        Some(plan) => log::print_message(&format!("On-chain plan:  {} at {}", plan.name, plan.height)),
        None => log::print_message("On-chain plan:  none"),
    }

    let upgrade_info = context.upgrade_info();
    match upgrade_info.read()? {
        Some(plan) => log::print_message(&format!(
            "Upgrade info:   {} at {} ({})",
            plan.name,
            plan.height,
            upgrade_info.path().display()
        )),
        None => log::print_message("Upgrade info:   none"),
    }

    log::print_divider();
    let stored = store.get_module_version_map()?;
    for (module, current) in ModuleManager::galactica().current_version_map() {
        let on_chain = stored.get(&module).copied();
        let marker = match on_chain {
            Some(version) if version == current => String::new(),
            Some(version) => format!(" (chain at {version})"),
            None => " (not on chain)".to_string(),
        };
        log::print_message(&format!("{module:<10} v{current}{marker}"));
    }

    log::print_divider();
    for (name, applied) in store.get_all_done()? {
        log::print_message(&format!("{name:<8} done at {}", applied.height));
    }
    Ok(())
}
