//! `keystash update` — replace a key's value.

use crate::cli::output;
use crate::cli::{open_store, read_secret_value, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `update` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, value: Option<&str>) -> Result<()> {
    let mut store = open_store(cli, settings)?;
    let key_id = store.resolve_key_id(id)?;
    let name = store.get_key(key_id)?.name.clone();

    let value = read_secret_value(&format!("Enter new value for {name}"), value)?;
    store.update_value(key_id, &value)?;
    store.save()?;

    output::success(&format!("Key '{name}' rotated"));
    Ok(())
}
