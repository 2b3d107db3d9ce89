//! `keystash project` — add, list, edit, and delete projects.

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli, ProjectAction};
use crate::config::Settings;
use crate::errors::{KeystashError, Result};

/// Execute a `project` subcommand.
pub fn execute(cli: &Cli, settings: &Settings, action: &ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add { name, description } => add(cli, settings, name, description.as_deref()),
        ProjectAction::List => list(cli, settings),
        ProjectAction::Edit {
            project,
            name,
            description,
        } => edit(cli, settings, project, name.as_deref(), description.as_deref()),
        ProjectAction::Delete { project, force } => delete(cli, settings, project, *force),
    }
}

fn add(cli: &Cli, settings: &Settings, name: &str, description: Option<&str>) -> Result<()> {
    let mut store = open_store(cli, settings)?;
    store.add_project(name, description)?;
    store.save()?;

    output::success(&format!(
        "Project '{}' created ({} total)",
        name.trim(),
        store.project_count()
    ));
    output::tip(&format!(
        "Add a key: keystash add {} <NAME> --service <SERVICE>",
        name.trim()
    ));
    Ok(())
}

fn list(cli: &Cli, settings: &Settings) -> Result<()> {
    let store = open_store(cli, settings)?;
    let projects = store.list_projects();

    output::info(&format!("{} project(s)", projects.len()));
    output::print_projects_table(&projects);
    Ok(())
}

fn edit(
    cli: &Cli,
    settings: &Settings,
    project: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    if name.is_none() && description.is_none() {
        return Err(KeystashError::InvalidInput(
            "nothing to change — pass --name and/or --description".into(),
        ));
    }

    let mut store = open_store(cli, settings)?;
    let id = store.find_project(project)?.id;
    store.update_project(id, name, description)?;
    store.save()?;

    output::success(&format!("Project '{project}' updated"));
    Ok(())
}

fn delete(cli: &Cli, settings: &Settings, project: &str, force: bool) -> Result<()> {
    let mut store = open_store(cli, settings)?;
    let found = store.find_project(project)?;
    let (id, name) = (found.id, found.name.clone());
    let key_count = store.list_keys(Some(id)).len();

    if !confirm(
        &format!("Delete project '{name}' and its {key_count} key(s)?"),
        force,
    )? {
        output::info("Cancelled.");
        return Ok(());
    }

    let removed = store.delete_project(id)?;
    store.save()?;

    output::success(&format!("Deleted project '{name}' ({removed} key(s) removed)"));
    Ok(())
}
