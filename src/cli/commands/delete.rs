//! `keystash delete` — remove an API key.

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, force: bool) -> Result<()> {
    let mut store = open_store(cli, settings)?;
    let key_id = store.resolve_key_id(id)?;
    let name = store.get_key(key_id)?.name.clone();

    // Unless --force is set, ask for confirmation before deleting.
    if !confirm(&format!("Delete key '{name}'?"), force)? {
        output::info("Cancelled.");
        return Ok(());
    }

    store.delete_key(key_id)?;
    store.save()?;

    output::success(&format!("Deleted key '{name}'"));
    Ok(())
}
