//! Lookup tokens: keyed, deterministic digests of secret values.
//!
//! `HMAC-SHA256(lookup_key, plaintext)`, encoded as unpadded URL-safe
//! base64.  Equal plaintexts give equal tokens, so the store can find a
//! record by value without decrypting anything.  Without the lookup key
//! an attacker holding the store cannot brute-force tokens offline.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::keys::{IndexKey, KEY_LEN};
use crate::errors::{KeystashError, Result};

/// Encoded length of a token (32 bytes -> 43 base64 chars).
pub const TOKEN_LEN: usize = 43;

/// An opaque lookup token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupToken(String);

impl LookupToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality check.
    pub fn matches(&self, other: &LookupToken) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for LookupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "LookupToken({prefix}...)")
    }
}

/// Computes lookup tokens with a key derived from the index key.
pub struct Tokenizer {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl Tokenizer {
    pub fn new(index_key: &IndexKey) -> Result<Self> {
        Ok(Self {
            key: index_key.derive_lookup_key()?,
        })
    }

    /// Digest `plaintext` into its lookup token.
    pub fn token(&self, plaintext: &str) -> Result<LookupToken> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.key.as_slice())
            .map_err(|e| KeystashError::HmacError(format!("invalid HMAC key: {e}")))?;
        mac.update(plaintext.as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(LookupToken(URL_SAFE_NO_PAD.encode(digest)))
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tokenizer([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(fill: u8) -> Tokenizer {
        Tokenizer::new(&IndexKey::new(vec![fill; 32]).unwrap()).unwrap()
    }

    #[test]
    fn token_is_deterministic_and_fixed_length() {
        let t = tokenizer(1);
        let a = t.token("sk-live-abc123").unwrap();
        let b = t.token("sk-live-abc123").unwrap();
        assert_eq!(a, b);
        assert!(a.matches(&b));
        assert_eq!(a.as_str().len(), TOKEN_LEN);
    }

    #[test]
    fn different_values_give_different_tokens() {
        let t = tokenizer(1);
        let a = t.token("sk-live-abc123").unwrap();
        let b = t.token("sk-live-abc124").unwrap();
        assert_ne!(a, b);
        assert!(!a.matches(&b));
    }

    #[test]
    fn token_depends_on_index_key() {
        let a = tokenizer(1).token("same").unwrap();
        let b = tokenizer(2).token("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_is_not_a_plain_sha256() {
        use sha2::Digest;
        let plain = URL_SAFE_NO_PAD.encode(Sha256::digest(b"same"));
        assert_ne!(tokenizer(1).token("same").unwrap().as_str(), plain);
    }

    #[test]
    fn debug_shows_only_a_prefix() {
        let token = tokenizer(1).token("value").unwrap();
        let shown = format!("{token:?}");
        assert!(shown.len() < TOKEN_LEN);
    }
}
