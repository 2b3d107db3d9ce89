//! `keystash add` — store a new API key in a project.

use crate::cli::output;
use crate::cli::{open_store, read_secret_value, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::store::{Environment, NewApiKey, RotationReminder};

/// Options collected from the command line.
pub struct AddArgs<'a> {
    pub project: &'a str,
    pub name: &'a str,
    pub service: &'a str,
    pub environment: Option<Environment>,
    pub notes: Option<&'a str>,
    pub reminder: Option<RotationReminder>,
    pub value: Option<&'a str>,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, settings: &Settings, args: AddArgs<'_>) -> Result<()> {
    let value = read_secret_value(&format!("Enter value for {}", args.name), args.value)?;

    let mut store = open_store(cli, settings)?;
    let project = store.find_project(args.project)?;
    let (project_id, project_name) = (project.id, project.name.clone());

    let id = store.add_key(
        project_id,
        NewApiKey {
            name: args.name,
            service: args.service,
            environment: args.environment.unwrap_or(settings.default_environment),
            value: &value,
            notes: args.notes,
            rotation_reminder: args.reminder.unwrap_or(settings.default_rotation_reminder),
        },
    )?;
    store.save()?;

    output::success(&format!(
        "Key '{}' added to {} ({} total)",
        args.name.trim(),
        project_name,
        store.list_keys(Some(project_id)).len()
    ));
    output::tip(&format!("Read it back: keystash get {}", crate::cli::short_id(&id)));

    Ok(())
}
