//! `keystash get` — decrypt and print (or copy) a single key's value.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{KeystashError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, copy: bool) -> Result<()> {
    let store = open_store(cli, settings)?;
    let key_id = store.resolve_key_id(id)?;
    let value = store.reveal(key_id)?;

    if copy {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| KeystashError::ClipboardError(e.to_string()))?;
        clipboard
            .set_text(value.as_str())
            .map_err(|e| KeystashError::ClipboardError(e.to_string()))?;
        output::success("Copied to clipboard");
    } else {
        println!("{}", value.as_str());
    }

    Ok(())
}
