//! `keystash versions` — configured key versions and their usage.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `versions` command.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let store = open_store(cli, settings)?;
    let mut counts = store.key_version_counts();
    let ring = store.codec().key_ring();
    let current = ring.current_version();

    let rows: Vec<(String, bool, usize)> = ring
        .versions()
        .into_iter()
        .map(|v| {
            let count = counts.remove(v.as_str()).unwrap_or(0);
            (v.to_string(), v == current, count)
        })
        .collect();

    output::print_versions_table(&rows);

    // Whatever is left is sealed under a version no key is configured for.
    for (version, count) in counts {
        output::warning(&format!(
            "{count} key(s) use version '{version}', which has no configured master key"
        ));
    }

    Ok(())
}
