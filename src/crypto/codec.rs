//! The envelope codec: the only place secret values are encrypted or
//! decrypted.
//!
//! `encrypt` seals a plaintext under the key ring's current version with a
//! fresh nonce.  `decrypt` resolves the envelope's recorded version and
//! opens it, failing closed on any authentication problem.
//! `lookup_token` gives the keyed digest used for search by value.

use std::fmt;
use std::sync::Arc;

use zeroize::{Zeroize, Zeroizing};

use super::encryption::{self, NONCE_LEN};
use super::envelope::Envelope;
use super::keys::{IndexKey, KeyRing, KeyVersion, KEY_LEN};
use super::nonce::{NonceSource, SystemRandom};
use super::token::{LookupToken, Tokenizer};
use crate::errors::{KeystashError, Result};

/// Stateless encrypt/decrypt/lookup-token service.
///
/// Cheap to share: the key ring and index key sit behind `Arc`s and the
/// nonce source is `Sync`, so one codec can serve any number of threads.
pub struct EnvelopeCodec<N = SystemRandom> {
    keys: Arc<KeyRing>,
    index: Arc<IndexKey>,
    tokenizer: Arc<Tokenizer>,
    nonces: N,
}

impl EnvelopeCodec<SystemRandom> {
    /// Build a codec that draws nonces from the OS random source.
    pub fn new(keys: KeyRing, index: IndexKey) -> Result<Self> {
        Self::with_nonce_source(keys, index, SystemRandom)
    }
}

impl<N: NonceSource> EnvelopeCodec<N> {
    /// Build a codec with an explicit nonce source.
    pub fn with_nonce_source(keys: KeyRing, index: IndexKey, nonces: N) -> Result<Self> {
        if keys.contains_key_material(index.as_bytes()) {
            return Err(KeystashError::ConfigError(
                "index key must differ from every master key".into(),
            ));
        }
        let tokenizer = Tokenizer::new(&index)?;
        Ok(Self {
            keys: Arc::new(keys),
            index: Arc::new(index),
            tokenizer: Arc::new(tokenizer),
            nonces,
        })
    }

    /// Publish a new key ring (e.g. after rotation).
    ///
    /// Returns a fresh codec; holders of `self` keep the old ring until
    /// they switch over, so in-flight decryptions are unaffected.
    pub fn with_key_ring(&self, keys: KeyRing) -> Self
    where
        N: Clone,
    {
        Self {
            keys: Arc::new(keys),
            index: Arc::clone(&self.index),
            tokenizer: Arc::clone(&self.tokenizer),
            nonces: self.nonces.clone(),
        }
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.keys
    }

    pub fn current_version(&self) -> &KeyVersion {
        self.keys.current_version()
    }

    /// Seal `plaintext` under the current key version.
    pub fn encrypt(&self, plaintext: &str) -> Result<Envelope> {
        self.encrypt_with_version(plaintext, self.keys.current_version())
    }

    /// Seal `plaintext` under a specific key version.
    pub fn encrypt_with_version(&self, plaintext: &str, version: &KeyVersion) -> Result<Envelope> {
        if plaintext.is_empty() {
            return Err(KeystashError::EncryptionFailed(
                "plaintext must not be empty".into(),
            ));
        }
        let key = self.keys.resolve(version)?;

        let nonce: [u8; NONCE_LEN] = self.nonces.next_nonce()?;
        let sealed = encryption::seal(key.as_bytes(), &nonce, plaintext.as_bytes())?;

        tracing::debug!(key_version = %version, "sealed envelope");

        Ok(Envelope::from_parts(
            sealed.ciphertext,
            nonce.to_vec(),
            sealed.tag.to_vec(),
            version.clone(),
        ))
    }

    /// Open an envelope and return the original plaintext.
    ///
    /// Fails with `KeyNotFound` when the envelope's key version is not in
    /// the ring, and `AuthenticationFailed` for everything else.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Zeroizing<String>> {
        let key = self.keys.resolve(envelope.key_version()).map_err(|e| {
            tracing::warn!(key_version = %envelope.key_version(), "no key for envelope version");
            e
        })?;

        let plaintext = encryption::open(
            key.as_bytes(),
            envelope.nonce(),
            envelope.ciphertext(),
            envelope.auth_tag(),
        )
        .map_err(|e| {
            tracing::warn!(key_version = %envelope.key_version(), "envelope failed authentication");
            e
        })?;

        // Sealed values are always UTF-8; anything else means the envelope
        // was not produced by `encrypt`.
        String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            KeystashError::AuthenticationFailed
        })
    }

    /// Keyed digest of `plaintext` for equality search.
    pub fn lookup_token(&self, plaintext: &str) -> Result<LookupToken> {
        self.tokenizer.token(plaintext)
    }

    /// Returns `true` if the envelope was sealed under an older key version.
    pub fn needs_reencrypt(&self, envelope: &Envelope) -> bool {
        envelope.key_version() != self.keys.current_version()
    }

    /// Decrypt and re-seal under the current version.
    pub fn reencrypt(&self, envelope: &Envelope) -> Result<Envelope> {
        let plaintext = self.decrypt(envelope)?;
        self.encrypt(&plaintext)
    }

    /// HMAC key protecting the record store file.
    pub fn store_integrity_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        self.index.derive_integrity_key()
    }
}

impl<N> fmt::Debug for EnvelopeCodec<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCodec")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
