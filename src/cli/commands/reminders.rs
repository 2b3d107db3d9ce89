//! `keystash reminders` — show keys that are due or overdue for rotation.

use chrono::Utc;

use crate::cli::output;
use crate::cli::{open_store, project_names, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `reminders` command.
pub fn execute(cli: &Cli, settings: &Settings, days: Option<u32>) -> Result<()> {
    let store = open_store(cli, settings)?;
    let warning_days = days.unwrap_or(settings.reminder_warning_days);
    let entries = store.rotation_report(Utc::now(), warning_days);

    if entries.is_empty() {
        output::success(&format!(
            "No key is due for rotation in the next {warning_days} day(s)"
        ));
        return Ok(());
    }

    output::warning(&format!("{} key(s) need rotating", entries.len()));
    output::print_reminders_table(&entries, &project_names(&store));
    output::tip("Rotate a key: keystash update <ID>");
    Ok(())
}
