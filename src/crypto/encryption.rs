//! AES-256-GCM authenticated encryption with a detached tag.
//!
//! The caller supplies the nonce; it must be fresh for every call under
//! the same key (see [`super::nonce`]).  The tag is returned separately
//! from the ciphertext so all three parts can be stored as distinct
//! envelope fields.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use zeroize::Zeroize;

use crate::errors::{KeystashError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Output of one encryption call.
#[derive(Debug)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` with a 32-byte `key` under `nonce`.
///
/// No associated data is bound.
pub fn seal(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| KeystashError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let mut buffer = plaintext.to_vec();
    let tag = match cipher.encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer) {
        Ok(tag) => tag,
        Err(e) => {
            buffer.zeroize();
            return Err(KeystashError::EncryptionFailed(format!(
                "encryption error: {e}"
            )));
        }
    };

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Sealed {
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Decrypt and verify data produced by [`seal`].
///
/// Any length mismatch or tag failure is reported as
/// `AuthenticationFailed`; no plaintext is returned in that case.
pub fn open(key: &[u8], nonce: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(KeystashError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| KeystashError::AuthenticationFailed)?;

    let mut buffer = ciphertext.to_vec();
    if cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::from_slice(tag),
        )
        .is_err()
    {
        // The buffer still holds ciphertext here, but clear it anyway so
        // nothing derived from a failed open survives.
        buffer.zeroize();
        return Err(KeystashError::AuthenticationFailed);
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];
    const NONCE: [u8; NONCE_LEN] = [7; NONCE_LEN];

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal(&KEY, &NONCE, b"sk-live-abc123").unwrap();
        assert_eq!(sealed.ciphertext.len(), b"sk-live-abc123".len());

        let plain = open(&KEY, &NONCE, &sealed.ciphertext, &sealed.tag).unwrap();
        assert_eq!(plain, b"sk-live-abc123");
    }

    #[test]
    fn seal_rejects_short_key() {
        let result = seal(&[0u8; 16], &NONCE, b"x");
        assert!(matches!(result, Err(KeystashError::EncryptionFailed(_))));
    }

    #[test]
    fn open_rejects_wrong_nonce_length() {
        let sealed = seal(&KEY, &NONCE, b"value").unwrap();
        let result = open(&KEY, &NONCE[..8], &sealed.ciphertext, &sealed.tag);
        assert!(matches!(result, Err(KeystashError::AuthenticationFailed)));
    }

    #[test]
    fn open_rejects_truncated_tag() {
        let sealed = seal(&KEY, &NONCE, b"value").unwrap();
        let result = open(&KEY, &NONCE, &sealed.ciphertext, &sealed.tag[..15]);
        assert!(matches!(result, Err(KeystashError::AuthenticationFailed)));
    }

    #[test]
    fn open_rejects_different_nonce() {
        let sealed = seal(&KEY, &NONCE, b"value").unwrap();
        let other = [8u8; NONCE_LEN];
        let result = open(&KEY, &other, &sealed.ciphertext, &sealed.tag);
        assert!(matches!(result, Err(KeystashError::AuthenticationFailed)));
    }
}
