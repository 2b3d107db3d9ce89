//! `keystash init` — create an empty store.

use crate::cli::output;
use crate::cli::{store_path, Cli};
use crate::config::{KeyConfig, Settings};
use crate::errors::{KeystashError, Result};
use crate::store::RecordStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let path = store_path(cli, settings)?;

    if path.exists() {
        output::tip("Use `keystash project add <NAME>` to start adding keys.");
        return Err(KeystashError::StoreAlreadyExists(path));
    }

    // Keys first: a store sealed under a missing or malformed key is useless.
    let codec = KeyConfig::from_env()?.into_codec()?;
    let store = RecordStore::create(&path, codec)?;

    output::success(&format!(
        "Store created at {} (key version {})",
        store.path().display(),
        store.codec().current_version()
    ));
    output::tip("Next: keystash project add <NAME>");

    Ok(())
}
