//! Key material configuration, read from the process environment.
//!
//! | Variable                 | Required | Meaning                                  |
//! |--------------------------|----------|------------------------------------------|
//! | `KEYSTASH_MASTER_KEY`    | yes      | current 256-bit master key               |
//! | `KEYSTASH_KEY_VERSION`   | no       | label of the current key (default `v1`)  |
//! | `KEYSTASH_PREVIOUS_KEYS` | no       | `version:key` pairs, comma-separated     |
//! | `KEYSTASH_INDEX_KEY`     | yes      | lookup-token / store-integrity secret    |
//!
//! Keys are given as 64 hex characters or standard base64.  A missing or
//! malformed key aborts start-up; there is no generated fallback key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroizing;

use crate::crypto::{EnvelopeCodec, IndexKey, KeyRing, KeyVersion, MasterKey};
use crate::errors::{KeystashError, Result};

pub const MASTER_KEY_VAR: &str = "KEYSTASH_MASTER_KEY";
pub const KEY_VERSION_VAR: &str = "KEYSTASH_KEY_VERSION";
pub const PREVIOUS_KEYS_VAR: &str = "KEYSTASH_PREVIOUS_KEYS";
pub const INDEX_KEY_VAR: &str = "KEYSTASH_INDEX_KEY";

/// Version label used when `KEYSTASH_KEY_VERSION` is unset.
pub const DEFAULT_KEY_VERSION: &str = "v1";

/// Key ring and index key, loaded once at process start.
#[derive(Debug)]
pub struct KeyConfig {
    pub key_ring: KeyRing,
    pub index_key: IndexKey,
}

impl KeyConfig {
    /// Load key material from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load key material through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Option<Zeroizing<String>> {
            lookup(name)
                .map(Zeroizing::new)
                .filter(|v| !v.trim().is_empty())
        };

        let master_raw =
            get(MASTER_KEY_VAR).ok_or_else(|| KeystashError::MissingConfig(MASTER_KEY_VAR.into()))?;
        let index_raw =
            get(INDEX_KEY_VAR).ok_or_else(|| KeystashError::MissingConfig(INDEX_KEY_VAR.into()))?;

        let current_version = match get(KEY_VERSION_VAR) {
            Some(v) => KeyVersion::new(v.trim()).map_err(|e| {
                KeystashError::ConfigError(format!("{KEY_VERSION_VAR}: {e}"))
            })?,
            None => KeyVersion::new(DEFAULT_KEY_VERSION)?,
        };

        let master_bytes = decode_key_material(MASTER_KEY_VAR, &master_raw)?;
        let master = MasterKey::from_slice(&master_bytes)
            .map_err(|e| KeystashError::ConfigError(format!("{MASTER_KEY_VAR}: {e}")))?;
        let mut key_ring = KeyRing::new(current_version, master);

        if let Some(previous) = get(PREVIOUS_KEYS_VAR) {
            for entry in previous.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let (label, encoded) = entry.split_once(':').ok_or_else(|| {
                    KeystashError::ConfigError(format!(
                        "{PREVIOUS_KEYS_VAR}: entries must look like `version:key`"
                    ))
                })?;
                let version = KeyVersion::new(label.trim()).map_err(|e| {
                    KeystashError::ConfigError(format!("{PREVIOUS_KEYS_VAR}: {e}"))
                })?;
                let bytes = decode_key_material(PREVIOUS_KEYS_VAR, encoded)?;
                let key = MasterKey::from_slice(&bytes).map_err(|e| {
                    KeystashError::ConfigError(format!("{PREVIOUS_KEYS_VAR} ({version}): {e}"))
                })?;
                key_ring = key_ring.with_previous(version, key)?;
            }
        }

        let index_bytes = decode_key_material(INDEX_KEY_VAR, &index_raw)?;
        let index_key = IndexKey::new(index_bytes.to_vec())
            .map_err(|e| KeystashError::ConfigError(format!("{INDEX_KEY_VAR}: {e}")))?;

        tracing::debug!(
            current = %key_ring.current_version(),
            versions = key_ring.versions().len(),
            "loaded key configuration"
        );

        Ok(Self {
            key_ring,
            index_key,
        })
    }

    /// Build the codec from this configuration.
    pub fn into_codec(self) -> Result<EnvelopeCodec> {
        EnvelopeCodec::new(self.key_ring, self.index_key)
    }
}

/// Decode key material given as 64 hex characters or base64.
///
/// Error messages name the variable but never echo its value.
pub fn decode_key_material(var: &str, raw: &str) -> Result<Zeroizing<Vec<u8>>> {
    let raw = raw.trim();

    if raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return hex::decode(raw)
            .map(Zeroizing::new)
            .map_err(|_| KeystashError::ConfigError(format!("{var}: invalid hex key")));
    }

    BASE64
        .decode(raw)
        .map(Zeroizing::new)
        .map_err(|_| KeystashError::ConfigError(format!("{var}: key is neither hex nor base64")))
}
