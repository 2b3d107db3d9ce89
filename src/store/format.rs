//! Binary store file format and HMAC integrity verification.
//!
//! A `.store` file has this layout:
//!
//! ```text
//! [KSTH: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][body JSON][HMAC-SHA256: 32 bytes]
//! ```
//!
//! - **Magic** (`KSTH`): identifies the file as a Keystash store.
//! - **Version**: format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the body JSON begins.
//! - **Header JSON**: serialized `StoreHeader`.
//! - **Body JSON**: serialized `StoreBody` (projects and key records).
//! - **HMAC-SHA256**: tag over header + body bytes, keyed with the
//!   store-integrity key derived from the index key.
//!
//! Secret values are already sealed per record; the HMAC additionally
//! catches edits to metadata, deleted records, and swapped envelopes.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::records::{ApiKeyRecord, Project};
use crate::errors::{KeystashError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every store file.
const MAGIC: &[u8; 4] = b"KSTH";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Size of the HMAC tag appended to the file (SHA-256 = 32 bytes).
const HMAC_LEN: usize = 32;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Header and body
// ---------------------------------------------------------------------------

/// Metadata stored at the beginning of a store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreHeader {
    /// Format version.
    pub version: u8,

    /// When this store was first created.
    pub created_at: DateTime<Utc>,
}

/// Everything the store holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreBody {
    pub projects: Vec<Project>,
    pub keys: Vec<ApiKeyRecord>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a store file to disk **atomically**.
///
/// 1. Serialize header and body to JSON.
/// 2. Compute HMAC over header + body bytes.
/// 3. Write to a temp file in the same directory.
/// 4. Rename temp file over the target path.
pub fn write_store(
    path: &Path,
    header: &StoreHeader,
    body: &StoreBody,
    hmac_key: &[u8],
) -> Result<()> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| KeystashError::SerializationError(format!("header: {e}")))?;
    let body_bytes = serde_json::to_vec(body)
        .map_err(|e| KeystashError::SerializationError(format!("body: {e}")))?;

    let hmac_tag = compute_hmac(hmac_key, &header_bytes, &body_bytes)?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        KeystashError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;
    let total = PREFIX_LEN + header_bytes.len() + body_bytes.len() + HMAC_LEN;
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&header_len.to_le_bytes());
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(&body_bytes);
    buf.extend_from_slice(&hmac_tag);

    // Same directory as the target so the rename stays on one filesystem.
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, &buf)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;

    tracing::debug!(path = %path.display(), bytes = buf.len(), "wrote store file");
    Ok(())
}

/// Raw data read from a store file on disk.
///
/// Keeps the original bytes so the HMAC can be verified over the
/// exact bytes that were written.
pub struct RawStore {
    pub header: StoreHeader,
    pub header_bytes: Vec<u8>,
    pub body_bytes: Vec<u8>,
    pub stored_hmac: Vec<u8>,
}

/// Read a store file and split it into its parts.
///
/// The body is left as raw bytes: callers verify the HMAC first and only
/// then deserialize it with [`parse_body`].
pub fn read_store(path: &Path) -> Result<RawStore> {
    if !path.exists() {
        return Err(KeystashError::StoreNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;

    let min_size = PREFIX_LEN + HMAC_LEN;
    if data.len() < min_size {
        return Err(KeystashError::InvalidStoreFormat(
            "file too small to be a valid store".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(KeystashError::InvalidStoreFormat(
            "missing KSTH magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(KeystashError::InvalidStoreFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| KeystashError::InvalidStoreFormat("bad header length".into()))?,
    );
    let header_len = usize::try_from(header_len_u32).map_err(|_| {
        KeystashError::InvalidStoreFormat(format!(
            "header length {header_len_u32} exceeds platform address space"
        ))
    })?;

    let header_end = PREFIX_LEN + header_len;
    if header_end + HMAC_LEN > data.len() {
        return Err(KeystashError::InvalidStoreFormat(
            "header length exceeds file size".into(),
        ));
    }

    let header_bytes = data[PREFIX_LEN..header_end].to_vec();
    let body_end = data.len() - HMAC_LEN;
    let body_bytes = data[header_end..body_end].to_vec();
    let stored_hmac = data[body_end..].to_vec();

    let header: StoreHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| KeystashError::InvalidStoreFormat(format!("header JSON: {e}")))?;

    Ok(RawStore {
        header,
        header_bytes,
        body_bytes,
        stored_hmac,
    })
}

/// Deserialize the body of a store whose HMAC has been verified.
pub fn parse_body(body_bytes: &[u8]) -> Result<StoreBody> {
    serde_json::from_slice(body_bytes)
        .map_err(|e| KeystashError::InvalidStoreFormat(format!("body JSON: {e}")))
}

/// Compute HMAC-SHA256 over header + body bytes.
pub fn compute_hmac(hmac_key: &[u8], header_bytes: &[u8], body_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| KeystashError::HmacError(format!("invalid HMAC key: {e}")))?;

    mac.update(header_bytes);
    mac.update(body_bytes);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify the HMAC in constant time.
pub fn verify_hmac(
    hmac_key: &[u8],
    header_bytes: &[u8],
    body_bytes: &[u8],
    expected_hmac: &[u8],
) -> Result<()> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| KeystashError::HmacError(format!("invalid HMAC key: {e}")))?;

    mac.update(header_bytes);
    mac.update(body_bytes);

    mac.verify_slice(expected_hmac)
        .map_err(|_| KeystashError::HmacMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: [u8; 32] = [0x33; 32];

    fn header() -> StoreHeader {
        StoreHeader {
            version: CURRENT_VERSION,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn write_then_read_verifies() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.store");

        write_store(&path, &header(), &StoreBody::default(), &KEY).unwrap();
        let raw = read_store(&path).unwrap();

        verify_hmac(&KEY, &raw.header_bytes, &raw.body_bytes, &raw.stored_hmac).unwrap();
        let body = parse_body(&raw.body_bytes).unwrap();
        assert!(body.projects.is_empty());
        assert!(!dir.path().join(".keys.store.tmp").exists());
    }

    #[test]
    fn wrong_key_fails_hmac() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.store");

        write_store(&path, &header(), &StoreBody::default(), &KEY).unwrap();
        let raw = read_store(&path).unwrap();

        let result = verify_hmac(&[0x34; 32], &raw.header_bytes, &raw.body_bytes, &raw.stored_hmac);
        assert!(matches!(result, Err(KeystashError::HmacMismatch)));
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.store");
        fs::write(&path, vec![0u8; 64]).unwrap();

        assert!(matches!(
            read_store(&path),
            Err(KeystashError::InvalidStoreFormat(_))
        ));
    }

    #[test]
    fn rejects_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.store");
        fs::write(&path, b"KSTH").unwrap();

        assert!(read_store(&path).is_err());
    }

    #[test]
    fn missing_file_is_store_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_store(&dir.path().join("nope.store")),
            Err(KeystashError::StoreNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.store");
        write_store(&path, &header(), &StoreBody::default(), &KEY).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
