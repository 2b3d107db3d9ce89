//! `keystash export` — write a project's keys as `.env` or JSON.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{KeystashError, Result};
use crate::store::ExportFormat;

/// Execute the `export` command.
pub fn execute(
    cli: &Cli,
    settings: &Settings,
    project: &str,
    format: &str,
    output_path: Option<&str>,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;

    let store = open_store(cli, settings)?;
    let project = store.find_project(project)?;
    let (project_id, project_name) = (project.id, project.name.clone());
    let content = store.export_project(project_id, format)?;

    // Write to file or stdout.
    match output_path {
        Some(dest) => {
            // Resolved the same way as `--store`, so the comparison below
            // sees two absolute paths.
            let dest_path = std::env::current_dir()?.join(dest);

            // Refuse to overwrite the store itself.
            if is_same_file(&dest_path, store.path())
                || dest_path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("store"))
            {
                return Err(KeystashError::CommandFailed(
                    "refusing to export over the key store".into(),
                ));
            }

            fs::write(&dest_path, content.as_bytes())?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dest_path, fs::Permissions::from_mode(0o600))?;
            }

            output::success(&format!(
                "Exported {} key(s) from '{project_name}' to {dest}",
                store.list_keys(Some(project_id)).len()
            ));
            output::warning("The exported file holds plaintext keys. Keep it out of version control.");
        }
        None => {
            print!("{}", content.as_str());
        }
    }

    Ok(())
}

/// Returns `true` if `a` and `b` name the same file.
///
/// Canonicalizes when both exist so `./keys.db`, `sub/../keys.db` and
/// symlinks all compare equal.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
