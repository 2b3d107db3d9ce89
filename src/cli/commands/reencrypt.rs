//! `keystash reencrypt` — migrate every envelope to the current key version.
//!
//! Run this after rotating `KEYSTASH_MASTER_KEY` (with the old key listed
//! in `KEYSTASH_PREVIOUS_KEYS`).  Once it reports zero remaining keys on
//! old versions, the old key can be dropped from the environment.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `reencrypt` command.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let mut store = open_store(cli, settings)?;
    let migrated = store.reencrypt_all()?;

    if migrated == 0 {
        output::info(&format!(
            "All keys already use version {}",
            store.codec().current_version()
        ));
        return Ok(());
    }

    store.save()?;
    output::success(&format!(
        "Re-encrypted {migrated} key(s) under version {}",
        store.codec().current_version()
    ));
    output::tip("Previous master keys can now be removed from KEYSTASH_PREVIOUS_KEYS.");
    Ok(())
}
