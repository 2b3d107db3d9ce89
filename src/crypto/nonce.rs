//! Nonce generation.
//!
//! The codec never derives a nonce from the key or the plaintext: every
//! seal draws 96 fresh bits from a [`NonceSource`].  The trait exists so
//! tests can substitute a deterministic or failing source.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;

use super::encryption::NONCE_LEN;
use crate::errors::{KeystashError, Result};

/// A source of unique nonces.  Must be safe to share across threads.
pub trait NonceSource: Send + Sync {
    /// Produce a nonce that has never been returned before for this key.
    fn next_nonce(&self) -> Result<[u8; NONCE_LEN]>;
}

/// Nonces drawn from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl NonceSource for SystemRandom {
    fn next_nonce(&self) -> Result<[u8; NONCE_LEN]> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut nonce).map_err(|e| {
            KeystashError::EncryptionFailed(format!("random source unavailable: {e}"))
        })?;
        Ok(nonce)
    }
}
