//! Key material: master keys, key versions, the key ring, and the index key.
//!
//! Master keys encrypt secret values and may rotate; every version ever
//! used stays in the [`KeyRing`] until it is deliberately retired.
//!
//! The [`IndexKey`] never rotates.  HKDF-SHA256 derives two independent
//! sub-keys from it:
//! - the **lookup-token** key (HMAC over plaintext values), and
//! - the **store-integrity** key (HMAC over the store file).

use std::collections::BTreeMap;
use std::fmt;

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{KeystashError, Result};

/// Length of master keys and derived sub-keys (256 bits).
pub const KEY_LEN: usize = 32;

/// Maximum length of a key version label.
const MAX_VERSION_LEN: usize = 32;

const LOOKUP_TOKEN_INFO: &[u8] = b"keystash-lookup-token";
const STORE_INTEGRITY_INFO: &[u8] = b"keystash-store-integrity";

// ---------------------------------------------------------------------------
// MasterKey
// ---------------------------------------------------------------------------

/// A 32-byte master encryption key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, rejecting anything that is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            KeystashError::ConfigError(format!(
                "master key must be exactly {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(arr))
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// KeyVersion
// ---------------------------------------------------------------------------

/// Label identifying which master key produced an envelope (e.g. `v1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyVersion(String);

impl KeyVersion {
    /// Validate and wrap a version label.
    ///
    /// Allowed: 1 to 32 ASCII letters, digits, `.`, `_` or `-`.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(KeystashError::InvalidKeyVersion(
                "key version cannot be empty".into(),
            ));
        }
        if label.len() > MAX_VERSION_LEN {
            return Err(KeystashError::InvalidKeyVersion(format!(
                "key version cannot exceed {MAX_VERSION_LEN} characters"
            )));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
        {
            return Err(KeystashError::InvalidKeyVersion(format!(
                "'{label}' contains invalid characters"
            )));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KeyVersion {
    type Error = KeystashError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<KeyVersion> for String {
    fn from(v: KeyVersion) -> Self {
        v.0
    }
}

// ---------------------------------------------------------------------------
// KeyRing
// ---------------------------------------------------------------------------

/// Mapping of key version -> master key, with exactly one current version.
///
/// New envelopes are always sealed under the current version; envelopes
/// from earlier versions keep opening as long as their key stays here.
pub struct KeyRing {
    current: KeyVersion,
    keys: BTreeMap<KeyVersion, MasterKey>,
}

impl KeyRing {
    /// Create a ring holding a single, current key.
    pub fn new(current: KeyVersion, key: MasterKey) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(current.clone(), key);
        Self { current, keys }
    }

    /// Add a previous (decrypt-only) key version.
    pub fn with_previous(mut self, version: KeyVersion, key: MasterKey) -> Result<Self> {
        if self.keys.contains_key(&version) {
            return Err(KeystashError::KeyRingError(format!(
                "key version '{version}' is configured twice"
            )));
        }
        self.keys.insert(version, key);
        Ok(self)
    }

    /// Make `version` the new current key, keeping the old one for decryption.
    ///
    /// Consumes the ring: callers publish the returned ring as a whole, so
    /// readers holding the old one are never affected mid-operation.
    pub fn rotate(mut self, version: KeyVersion, key: MasterKey) -> Result<Self> {
        if self.keys.contains_key(&version) {
            return Err(KeystashError::KeyRingError(format!(
                "cannot rotate to existing key version '{version}'"
            )));
        }
        tracing::info!(from = %self.current, to = %version, "rotating master key");
        self.keys.insert(version.clone(), key);
        self.current = version;
        Ok(self)
    }

    /// Remove a previous key version.  Envelopes sealed under it become
    /// unreadable (`KeyNotFound`).
    pub fn retire(&mut self, version: &KeyVersion) -> Result<()> {
        if *version == self.current {
            return Err(KeystashError::KeyRingError(format!(
                "cannot retire the current key version '{version}'"
            )));
        }
        self.keys
            .remove(version)
            .map(drop)
            .ok_or_else(|| KeystashError::KeyNotFound(version.to_string()))
    }

    /// The version new envelopes are sealed under.
    pub fn current_version(&self) -> &KeyVersion {
        &self.current
    }

    /// The key new envelopes are sealed under.
    pub fn current_key(&self) -> &MasterKey {
        // The constructor and `rotate` always insert the current key.
        &self.keys[&self.current]
    }

    /// Look up the key for a specific version.
    pub fn resolve(&self, version: &KeyVersion) -> Result<&MasterKey> {
        self.keys
            .get(version)
            .ok_or_else(|| KeystashError::KeyNotFound(version.to_string()))
    }

    /// Returns `true` if any configured version uses these key bytes.
    pub fn contains_key_material(&self, candidate: &[u8]) -> bool {
        self.keys
            .values()
            .any(|k| bool::from(k.as_bytes().as_slice().ct_eq(candidate)))
    }

    /// All configured versions, sorted.
    pub fn versions(&self) -> Vec<&KeyVersion> {
        self.keys.keys().collect()
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("current", &self.current)
            .field("versions", &self.versions())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// IndexKey
// ---------------------------------------------------------------------------

/// Minimum length of the index key material.
pub const MIN_INDEX_KEY_LEN: usize = 32;

/// Non-rotating secret used for lookup tokens and store integrity.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct IndexKey {
    bytes: Vec<u8>,
}

impl IndexKey {
    /// Wrap raw key material (at least 32 bytes).
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_INDEX_KEY_LEN {
            let len = bytes.len();
            let mut bytes = bytes;
            bytes.zeroize();
            return Err(KeystashError::ConfigError(format!(
                "index key must be at least {MIN_INDEX_KEY_LEN} bytes, got {len}"
            )));
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Derive the HMAC key used for lookup tokens.
    pub fn derive_lookup_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        hkdf_derive(&self.bytes, LOOKUP_TOKEN_INFO)
    }

    /// Derive the HMAC key used to protect the store file.
    pub fn derive_integrity_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        hkdf_derive(&self.bytes, STORE_INTEGRITY_INFO)
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IndexKey([REDACTED])")
    }
}

/// Run HKDF-SHA256 with the given `info`.
///
/// The extract step runs with no salt; the input is already a
/// high-entropy secret, not a password.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(info, okm.as_mut_slice())
        .map_err(|e| KeystashError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}
