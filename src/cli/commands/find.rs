//! `keystash find` — locate keys holding a given value without decrypting.

use crate::cli::output;
use crate::cli::{open_store, project_names, read_secret_value, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `find` command.
pub fn execute(cli: &Cli, settings: &Settings, value: Option<&str>) -> Result<()> {
    let value = read_secret_value("Value to search for", value)?;

    let store = open_store(cli, settings)?;
    let matches = store.find_by_value(&value)?;

    if matches.is_empty() {
        output::info("No key holds that value.");
        return Ok(());
    }

    output::info(&format!("{} key(s) hold that value", matches.len()));
    output::print_keys_table(&matches, &project_names(&store), None);
    Ok(())
}
