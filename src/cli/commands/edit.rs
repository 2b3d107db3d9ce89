//! `keystash edit` — change a key's descriptive fields.
//!
//! The value is never touched here; use `keystash update` for that.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{KeystashError, Result};
use crate::store::KeyDetailsUpdate;

/// Execute the `edit` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, update: KeyDetailsUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(KeystashError::InvalidInput(
            "nothing to change — pass at least one of --name, --service, --env, --notes, --reminder"
                .into(),
        ));
    }

    let mut store = open_store(cli, settings)?;
    let key_id = store.resolve_key_id(id)?;
    store.update_details(key_id, update)?;
    store.save()?;

    let name = &store.get_key(key_id)?.name;
    output::success(&format!("Key '{name}' updated"));
    Ok(())
}
