//! High-level store operations used by CLI commands.
//!
//! `RecordStore` wraps the file format layer and the envelope codec so the
//! rest of the application can work with calls like
//! `store.add_key(project_id, new_key)`.  Plaintext values only pass
//! through here on their way into or out of the codec.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::EnvelopeCodec;
use crate::errors::{KeystashError, Result};

use super::export::{self, ExportEntry, ExportFormat};
use super::format::{self, StoreBody, StoreHeader, CURRENT_VERSION};
use super::records::{
    ApiKeyMetadata, ApiKeyRecord, KeyDetailsUpdate, NewApiKey, Project, ProjectSummary,
    ReminderEntry,
};

/// Maximum length of project names.
const MAX_PROJECT_NAME_LEN: usize = 64;

/// Maximum length of key names and service names.
const MAX_FIELD_LEN: usize = 128;

/// Shortest id prefix accepted in place of a full UUID.
const MIN_ID_PREFIX_LEN: usize = 4;

/// The store handle.  Create one with `RecordStore::create` or
/// `RecordStore::open`, then use its methods to manage projects and keys.
pub struct RecordStore {
    /// Path to the store file on disk.
    path: PathBuf,

    header: StoreHeader,

    projects: BTreeMap<Uuid, Project>,

    keys: BTreeMap<Uuid, ApiKeyRecord>,

    codec: EnvelopeCodec,
}

impl RecordStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new, empty store file at `path`.
    pub fn create(path: &Path, codec: EnvelopeCodec) -> Result<Self> {
        if path.exists() {
            return Err(KeystashError::StoreAlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
            header: StoreHeader {
                version: CURRENT_VERSION,
                created_at: Utc::now(),
            },
            projects: BTreeMap::new(),
            keys: BTreeMap::new(),
            codec,
        };
        store.save()?;

        tracing::info!(path = %path.display(), "created store");
        Ok(store)
    }

    /// Open an existing store, verifying its integrity before parsing it.
    pub fn open(path: &Path, codec: EnvelopeCodec) -> Result<Self> {
        let raw = format::read_store(path)?;

        let hmac_key = codec.store_integrity_key()?;
        format::verify_hmac(
            hmac_key.as_slice(),
            &raw.header_bytes,
            &raw.body_bytes,
            &raw.stored_hmac,
        )
        .map_err(|e| {
            tracing::warn!(path = %path.display(), "store integrity check failed");
            e
        })?;

        let body = format::parse_body(&raw.body_bytes)?;

        let projects: BTreeMap<Uuid, Project> =
            body.projects.into_iter().map(|p| (p.id, p)).collect();
        let keys: BTreeMap<Uuid, ApiKeyRecord> = body.keys.into_iter().map(|k| (k.id, k)).collect();

        if let Some(orphan) = keys.values().find(|k| !projects.contains_key(&k.project_id)) {
            return Err(KeystashError::InvalidStoreFormat(format!(
                "key {} references a missing project",
                orphan.id
            )));
        }

        tracing::debug!(
            path = %path.display(),
            projects = projects.len(),
            keys = keys.len(),
            "opened store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            header: raw.header,
            projects,
            keys,
            codec,
        })
    }

    /// Serialize the store and write it to disk atomically.
    pub fn save(&self) -> Result<()> {
        let body = StoreBody {
            projects: self.projects.values().cloned().collect(),
            keys: self.keys.values().cloned().collect(),
        };
        let hmac_key = self.codec.store_integrity_key()?;
        format::write_store(&self.path, &self.header, &body, hmac_key.as_slice())
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Create a project.  Names are unique, ignoring case.
    pub fn add_project(&mut self, name: &str, description: Option<&str>) -> Result<Uuid> {
        let name = validate_project_name(name)?;
        if self.project_by_name(&name).is_some() {
            return Err(KeystashError::ProjectAlreadyExists(name));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name,
            description: non_empty(description),
            created_at: now,
            updated_at: now,
        };
        let id = project.id;
        tracing::info!(project_id = %id, "added project");
        self.projects.insert(id, project);
        Ok(id)
    }

    /// Find a project by id, unique id prefix, or name (case-insensitive).
    pub fn find_project(&self, name_or_id: &str) -> Result<&Project> {
        if let Some(p) = self.project_by_name(name_or_id) {
            return Ok(p);
        }
        let id = resolve_id(self.projects.keys(), name_or_id)
            .ok_or_else(|| KeystashError::ProjectNotFound(name_or_id.to_string()))??;
        Ok(&self.projects[&id])
    }

    /// All projects with their key counts, sorted by name.
    pub fn list_projects(&self) -> Vec<ProjectSummary> {
        let mut list: Vec<ProjectSummary> = self
            .projects
            .values()
            .map(|p| ProjectSummary {
                project: p.clone(),
                key_count: self.keys.values().filter(|k| k.project_id == p.id).count(),
            })
            .collect();
        list.sort_by_key(|s| s.project.name.to_lowercase());
        list
    }

    /// Rename a project and/or change its description.
    ///
    /// An empty description clears it.
    pub fn update_project(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let new_name = match name {
            Some(n) => {
                let n = validate_project_name(n)?;
                if self.project_by_name(&n).is_some_and(|p| p.id != id) {
                    return Err(KeystashError::ProjectAlreadyExists(n));
                }
                Some(n)
            }
            None => None,
        };

        let project = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| KeystashError::ProjectNotFound(id.to_string()))?;
        if let Some(n) = new_name {
            project.name = n;
        }
        if let Some(d) = description {
            project.description = non_empty(Some(d));
        }
        project.updated_at = Utc::now();
        Ok(())
    }

    /// Delete a project and every key in it.  Returns the number of keys removed.
    pub fn delete_project(&mut self, id: Uuid) -> Result<usize> {
        if self.projects.remove(&id).is_none() {
            return Err(KeystashError::ProjectNotFound(id.to_string()));
        }
        let before = self.keys.len();
        self.keys.retain(|_, k| k.project_id != id);
        let removed = before - self.keys.len();
        tracing::info!(project_id = %id, keys_removed = removed, "deleted project");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Encrypt and store a new API key in a project.
    pub fn add_key(&mut self, project_id: Uuid, new_key: NewApiKey<'_>) -> Result<Uuid> {
        if !self.projects.contains_key(&project_id) {
            return Err(KeystashError::ProjectNotFound(project_id.to_string()));
        }
        let name = validate_field("key name", new_key.name)?;
        let service = validate_field("service", new_key.service)?;

        let envelope = self.codec.encrypt(new_key.value)?;
        let lookup_token = self.codec.lookup_token(new_key.value)?;

        let now = Utc::now();
        let record = ApiKeyRecord {
            id: Uuid::new_v4(),
            project_id,
            name,
            service,
            environment: new_key.environment,
            envelope,
            lookup_token,
            notes: non_empty(new_key.notes),
            rotation_reminder: new_key.rotation_reminder,
            last_rotated: None,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;

        tracing::info!(
            key_id = %id,
            project_id = %project_id,
            key_version = %record.envelope.key_version(),
            "added API key"
        );
        self.keys.insert(id, record);
        Ok(id)
    }

    /// Resolve a full key id or a unique id prefix.
    pub fn resolve_key_id(&self, id_or_prefix: &str) -> Result<Uuid> {
        resolve_id(self.keys.keys(), id_or_prefix)
            .ok_or_else(|| KeystashError::ApiKeyNotFound(id_or_prefix.to_string()))?
    }

    /// Borrow a key record.
    pub fn get_key(&self, id: Uuid) -> Result<&ApiKeyRecord> {
        self.keys
            .get(&id)
            .ok_or_else(|| KeystashError::ApiKeyNotFound(id.to_string()))
    }

    /// Metadata for all keys (or one project's keys), sorted by name.
    ///
    /// No decryption happens here.
    pub fn list_keys(&self, project_id: Option<Uuid>) -> Vec<ApiKeyMetadata> {
        let mut list: Vec<ApiKeyMetadata> = self
            .keys
            .values()
            .filter(|k| project_id.map_or(true, |p| k.project_id == p))
            .map(ApiKeyMetadata::from)
            .collect();
        list.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        list
    }

    /// Decrypt and return a key's value.
    pub fn reveal(&self, id: Uuid) -> Result<Zeroizing<String>> {
        let record = self.get_key(id)?;
        let value = self.codec.decrypt(&record.envelope)?;
        tracing::info!(key_id = %id, "revealed API key");
        Ok(value)
    }

    /// Decrypt a key and return it masked for display.
    pub fn masked_value(&self, id: Uuid) -> Result<String> {
        let record = self.get_key(id)?;
        let value = self.codec.decrypt(&record.envelope)?;
        Ok(export::mask_value(&value))
    }

    /// Replace a key's value.
    ///
    /// The whole envelope and lookup token are regenerated; the old
    /// envelope is discarded, never patched.  Counts as a rotation.
    pub fn update_value(&mut self, id: Uuid, value: &str) -> Result<()> {
        let envelope = self.codec.encrypt(value)?;
        let lookup_token = self.codec.lookup_token(value)?;

        let record = self
            .keys
            .get_mut(&id)
            .ok_or_else(|| KeystashError::ApiKeyNotFound(id.to_string()))?;
        let now = Utc::now();
        record.envelope = envelope;
        record.lookup_token = lookup_token;
        record.last_rotated = Some(now);
        record.updated_at = now;

        tracing::info!(key_id = %id, key_version = %record.envelope.key_version(), "rotated API key value");
        Ok(())
    }

    /// Change a key's descriptive fields.
    pub fn update_details(&mut self, id: Uuid, update: KeyDetailsUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(KeystashError::InvalidInput("nothing to update".into()));
        }
        let name = update
            .name
            .as_deref()
            .map(|n| validate_field("key name", n))
            .transpose()?;
        let service = update
            .service
            .as_deref()
            .map(|s| validate_field("service", s))
            .transpose()?;

        let record = self
            .keys
            .get_mut(&id)
            .ok_or_else(|| KeystashError::ApiKeyNotFound(id.to_string()))?;

        if let Some(n) = name {
            record.name = n;
        }
        if let Some(s) = service {
            record.service = s;
        }
        if let Some(env) = update.environment {
            record.environment = env;
        }
        if let Some(notes) = update.notes {
            record.notes = non_empty(Some(notes.as_str()));
        }
        if let Some(reminder) = update.rotation_reminder {
            record.rotation_reminder = reminder;
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Remove a key (and its envelope) from the store.
    pub fn delete_key(&mut self, id: Uuid) -> Result<()> {
        if self.keys.remove(&id).is_none() {
            return Err(KeystashError::ApiKeyNotFound(id.to_string()));
        }
        tracing::info!(key_id = %id, "deleted API key");
        Ok(())
    }

    /// Find keys whose value equals `value`, by lookup token only.
    pub fn find_by_value(&self, value: &str) -> Result<Vec<ApiKeyMetadata>> {
        let token = self.codec.lookup_token(value)?;
        Ok(self
            .keys
            .values()
            .filter(|k| k.lookup_token.matches(&token))
            .map(ApiKeyMetadata::from)
            .collect())
    }

    // ------------------------------------------------------------------
    // Reminders, export, migration
    // ------------------------------------------------------------------

    /// Keys due for rotation soon or overdue, most urgent first.
    pub fn rotation_report(&self, now: DateTime<Utc>, warning_days: u32) -> Vec<ReminderEntry> {
        let mut entries: Vec<ReminderEntry> = self
            .keys
            .values()
            .filter_map(|k| {
                let status = k
                    .rotation_reminder
                    .status(k.rotation_anchor(), now, warning_days);
                status.needs_attention().then(|| ReminderEntry {
                    key: ApiKeyMetadata::from(k),
                    status,
                })
            })
            .collect();
        entries.sort_by_key(|e| e.status.urgency());
        entries
    }

    /// Decrypt every key of a project and render it in `format`.
    pub fn export_project(&self, project_id: Uuid, format: ExportFormat) -> Result<Zeroizing<String>> {
        if !self.projects.contains_key(&project_id) {
            return Err(KeystashError::ProjectNotFound(project_id.to_string()));
        }

        let mut records: Vec<&ApiKeyRecord> = self
            .keys
            .values()
            .filter(|k| k.project_id == project_id)
            .collect();
        records.sort_by(|a, b| {
            (a.service.to_lowercase(), a.name.to_lowercase(), a.created_at)
                .cmp(&(b.service.to_lowercase(), b.name.to_lowercase(), b.created_at))
        });

        let mut entries = Vec::with_capacity(records.len());
        for r in records {
            entries.push(ExportEntry {
                service: r.service.clone(),
                name: r.name.clone(),
                value: self.codec.decrypt(&r.envelope)?,
            });
        }
        let count = entries.len();
        let vars = export::assign_variable_names(entries);

        let content = match format {
            ExportFormat::Env => export::format_as_env(&vars),
            ExportFormat::Json => export::format_as_json(&vars)?,
        };
        tracing::info!(project_id = %project_id, keys = count, "exported project");
        Ok(content)
    }

    /// Re-encrypt every envelope not sealed under the current key version.
    ///
    /// Returns how many envelopes were migrated.  Nothing is changed if
    /// any envelope fails to decrypt.
    pub fn reencrypt_all(&mut self) -> Result<usize> {
        let mut migrated = Vec::new();
        for (id, record) in &self.keys {
            if self.codec.needs_reencrypt(&record.envelope) {
                migrated.push((*id, self.codec.reencrypt(&record.envelope)?));
            }
        }

        let count = migrated.len();
        for (id, envelope) in migrated {
            if let Some(record) = self.keys.get_mut(&id) {
                record.envelope = envelope;
            }
        }
        tracing::info!(
            migrated = count,
            key_version = %self.codec.current_version(),
            "re-encrypted envelopes"
        );
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.header.created_at
    }

    /// Number of keys sealed under each key version.
    pub fn key_version_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for k in self.keys.values() {
            *counts
                .entry(k.envelope.key_version().to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    fn project_by_name(&self, name: &str) -> Option<&Project> {
        let wanted = name.trim().to_lowercase();
        self.projects
            .values()
            .find(|p| p.name.to_lowercase() == wanted)
    }
}

// ----------------------------------------------------------------------
// Validation helpers
// ----------------------------------------------------------------------

fn validate_project_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KeystashError::InvalidInput(
            "project name cannot be empty".into(),
        ));
    }
    if name.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(KeystashError::InvalidInput(format!(
            "project name cannot exceed {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_field(what: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(KeystashError::InvalidInput(format!("{what} cannot be empty")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(KeystashError::InvalidInput(format!(
            "{what} cannot exceed {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Match a full UUID or a unique prefix of one.
///
/// `None` means nothing matched; `Some(Err)` means the prefix was ambiguous.
fn resolve_id<'a>(mut ids: impl Iterator<Item = &'a Uuid>, input: &str) -> Option<Result<Uuid>> {
    let input = input.trim().to_ascii_lowercase();
    if let Ok(id) = Uuid::parse_str(&input) {
        return ids.any(|candidate| *candidate == id).then_some(Ok(id));
    }
    if input.len() < MIN_ID_PREFIX_LEN {
        return None;
    }

    let matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(&input))
        .copied()
        .collect();
    match matches.as_slice() {
        [] => None,
        [one] => Some(Ok(*one)),
        _ => Some(Err(KeystashError::InvalidInput(format!(
            "id prefix '{input}' is ambiguous ({} matches)",
            matches.len()
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_id_matches_full_and_prefix() {
        let a = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        let b = Uuid::parse_str("11119999-2222-4333-8444-555555555555").unwrap();
        let ids = [a, b];

        assert_eq!(resolve_id(ids.iter(), &a.to_string()).unwrap().unwrap(), a);
        assert_eq!(resolve_id(ids.iter(), "111199").unwrap().unwrap(), b);
        assert!(resolve_id(ids.iter(), "1111").unwrap().is_err());
        assert!(resolve_id(ids.iter(), "111").is_none());
        assert!(resolve_id(ids.iter(), "abcd").is_none());
    }

    #[test]
    fn validate_project_name_trims_and_bounds() {
        assert_eq!(validate_project_name("  Billing ").unwrap(), "Billing");
        assert!(validate_project_name("   ").is_err());
        assert!(validate_project_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn non_empty_drops_blank_strings() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" note ")), Some("note".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
