use anyhow::Result;
use std::path::PathBuf;

use crate::cli::Context;
use crate::log;

/// Needs the writable store, so the node must be stopped.
pub fn handle_export_genesis(context: &Context, output: Option<PathBuf>) -> Result<()> {
    let app = context.open_app()?;
    let state = app.export_genesis(context.chain_id())?;

    match output {
        Some(path) => {
            state.save(&path)?;
            log::print_success(&format!(
                "Exported height {} to {}",
                app.latest_height()?.unwrap_or_default(),
                path.display()
            ));
        }
        None => println!("{}", serde_json::to_string_pretty(&state)?),
    }
    Ok(())
}
