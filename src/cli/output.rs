//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use std::collections::HashMap;

use comfy_table::{ContentArrangement, Table};
use console::style;
use uuid::Uuid;

use crate::cli::short_id;
use crate::store::{ApiKeyMetadata, ProjectSummary, ReminderEntry, RotationStatus};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of projects (Name, Keys, Description, Created).
pub fn print_projects_table(projects: &[ProjectSummary]) {
    if projects.is_empty() {
        info("No projects yet.");
        tip("Run `keystash project add <NAME>` to create one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Keys", "Description", "Created"]);

    for p in projects {
        table.add_row(vec![
            p.project.name.clone(),
            p.key_count.to_string(),
            p.project.description.clone().unwrap_or_default(),
            p.project.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a table of key metadata.
///
/// `project_names` maps project ids to names; `masked` holds an optional
/// masked value per key id.
pub fn print_keys_table(
    keys: &[ApiKeyMetadata],
    project_names: &HashMap<Uuid, String>,
    masked: Option<&HashMap<Uuid, String>>,
) {
    if keys.is_empty() {
        info("No API keys here yet.");
        tip("Run `keystash add <PROJECT> <NAME> --service <SERVICE>` to add one.");
        return;
    }

    let mut header = vec!["Id", "Project", "Name", "Service", "Env", "Reminder", "Updated"];
    if masked.is_some() {
        header.push("Value");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);

    for k in keys {
        let mut row = vec![
            short_id(&k.id),
            project_names.get(&k.project_id).cloned().unwrap_or_default(),
            k.name.clone(),
            k.service.clone(),
            k.environment.to_string(),
            k.rotation_reminder.to_string(),
            k.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ];
        if let Some(values) = masked {
            row.push(values.get(&k.id).cloned().unwrap_or_else(|| "?".into()));
        }
        table.add_row(row);
    }

    println!("{table}");
}

/// Print keys that need rotating, most urgent first.
pub fn print_reminders_table(entries: &[ReminderEntry], project_names: &HashMap<Uuid, String>) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Project", "Name", "Service", "Status"]);

    for e in entries {
        let status = match e.status {
            RotationStatus::Overdue { .. } => style(e.status.to_string()).red().to_string(),
            _ => style(e.status.to_string()).yellow().to_string(),
        };
        table.add_row(vec![
            short_id(&e.key.id),
            project_names.get(&e.key.project_id).cloned().unwrap_or_default(),
            e.key.name.clone(),
            e.key.service.clone(),
            status,
        ]);
    }

    println!("{table}");
}

/// Print configured key versions with how many records each one seals.
pub fn print_versions_table(rows: &[(String, bool, usize)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Version", "Current", "Keys"]);

    for (version, current, count) in rows {
        table.add_row(vec![
            version.clone(),
            if *current { "yes".into() } else { String::new() },
            count.to_string(),
        ]);
    }

    println!("{table}");
}
