//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::collections::HashMap;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::{KeyConfig, Settings};
use crate::errors::{KeystashError, Result};
use crate::store::{Environment, RecordStore, RotationReminder};

/// Keystash CLI: encrypted API key manager.
#[derive(Parser)]
#[command(name = "keystash", about = "Encrypted API key manager", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store file (default: from keystash.toml, else .keystash/keys.store)
    #[arg(long, global = true, env = "KEYSTASH_STORE")]
    pub store: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print a fresh random 256-bit key for KEYSTASH_MASTER_KEY / KEYSTASH_INDEX_KEY
    Keygen {
        /// Print as hex instead of base64
        #[arg(long)]
        hex: bool,
    },

    /// Create an empty store
    Init,

    /// Manage projects (add, list, edit, delete)
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Add an API key to a project
    Add {
        /// Project name or id
        project: String,
        /// Key name (e.g. "live")
        name: String,
        /// Service the key belongs to (e.g. stripe)
        #[arg(short, long)]
        service: String,
        /// development, staging, or production
        #[arg(short, long)]
        env: Option<Environment>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Rotation reminder: 30, 60, 90, 180, or none
        #[arg(short, long)]
        reminder: Option<RotationReminder>,
        /// Key value (omit for interactive prompt or stdin)
        value: Option<String>,
    },

    /// List API keys
    List {
        /// Only list keys in this project
        project: Option<String>,
        /// Show masked values (decrypts each key)
        #[arg(long)]
        masked: bool,
    },

    /// Print a key's value
    Get {
        /// Key id or unique id prefix
        id: String,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
    },

    /// Find keys with a given value (no decryption)
    Find {
        /// Value to search for (omit for interactive prompt or stdin)
        value: Option<String>,
    },

    /// Replace a key's value (rotation)
    Update {
        /// Key id or unique id prefix
        id: String,
        /// New value (omit for interactive prompt or stdin)
        value: Option<String>,
    },

    /// Change a key's name, service, environment, notes, or reminder
    Edit {
        /// Key id or unique id prefix
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        env: Option<Environment>,
        /// New notes (empty string clears them)
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        reminder: Option<RotationReminder>,
    },

    /// Delete a key
    Delete {
        /// Key id or unique id prefix
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export a project's keys as .env or JSON
    Export {
        /// Project name or id
        project: String,
        /// Output format: env (default) or json
        #[arg(short, long, default_value = "env")]
        format: String,
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show keys due for rotation
    Reminders {
        /// Warn this many days ahead (default: from keystash.toml)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Re-encrypt all keys under the current master key version
    Reencrypt,

    /// Show configured key versions and how many keys use each
    Versions,
}

/// Project subcommands.
#[derive(clap::Subcommand)]
pub enum ProjectAction {
    /// Create a project
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List projects with key counts
    List,

    /// Rename a project or change its description
    Edit {
        /// Project name or id
        project: String,
        #[arg(long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project and all of its keys
    Delete {
        /// Project name or id
        project: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `keystash.toml` from the working directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the store path: `--store` / `KEYSTASH_STORE`, else settings.
pub fn store_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.store {
        Some(p) => cwd.join(p),
        None => settings.store_path(&cwd),
    })
}

/// Load key material and open the store.
///
/// Key configuration is read first so a missing master key aborts before
/// anything touches the disk.
pub fn open_store(cli: &Cli, settings: &Settings) -> Result<RecordStore> {
    let codec = KeyConfig::from_env()?.into_codec()?;
    let path = store_path(cli, settings)?;
    RecordStore::open(&path, codec)
}

/// Read a secret value from, in order:
/// 1. the command-line argument (with a shell-history warning),
/// 2. stdin when it is piped,
/// 3. a hidden interactive prompt.
pub fn read_secret_value(prompt: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    let value = if let Some(v) = inline {
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        let v = dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(|e| KeystashError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(v)
    };

    if value.is_empty() {
        return Err(KeystashError::InvalidInput("value cannot be empty".into()));
    }
    Ok(value)
}

/// Ask for confirmation unless `force` is set.
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| KeystashError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Map of project id to project name, for table output.
pub fn project_names(store: &RecordStore) -> HashMap<Uuid, String> {
    store
        .list_projects()
        .into_iter()
        .map(|s| (s.project.id, s.project.name))
        .collect()
}

/// Short form of an id for tables (first 8 hex chars).
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
