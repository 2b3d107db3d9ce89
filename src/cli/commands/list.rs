//! `keystash list` — display API keys in a table.

use std::collections::HashMap;

use crate::cli::output;
use crate::cli::{open_store, project_names, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, settings: &Settings, project: Option<&str>, masked: bool) -> Result<()> {
    let store = open_store(cli, settings)?;

    let project_id = match project {
        Some(p) => Some(store.find_project(p)?.id),
        None => None,
    };
    let keys = store.list_keys(project_id);

    let masked_values = if masked {
        let mut values = HashMap::with_capacity(keys.len());
        for k in &keys {
            values.insert(k.id, store.masked_value(k.id)?);
        }
        Some(values)
    } else {
        None
    };

    output::info(&format!("{} key(s)", keys.len()));
    output::print_keys_table(&keys, &project_names(&store), masked_values.as_ref());

    Ok(())
}
