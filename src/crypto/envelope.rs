//! The persisted envelope for one encrypted secret.
//!
//! Stored as an opaque JSON object on the owning record:
//!
//! ```text
//! { "ciphertext": "<base64>", "nonce": "<base64>", "auth_tag": "<base64>", "key_version": "v1" }
//! ```
//!
//! The three binary fields only make sense together.  Callers never patch
//! one of them; a changed secret always gets a whole new envelope.

use serde::{Deserialize, Serialize};

use super::keys::KeyVersion;
use crate::serde_b64::{base64_decode, base64_encode};

/// Ciphertext, nonce, detached tag, and the key version that sealed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub(crate) ciphertext: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub(crate) nonce: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub(crate) auth_tag: Vec<u8>,

    pub(crate) key_version: KeyVersion,
}

impl Envelope {
    /// Reassemble an envelope from stored parts.
    ///
    /// Lengths are not checked here; a malformed envelope fails
    /// authentication on decrypt.
    pub fn from_parts(
        ciphertext: Vec<u8>,
        nonce: Vec<u8>,
        auth_tag: Vec<u8>,
        key_version: KeyVersion,
    ) -> Self {
        Self {
            ciphertext,
            nonce,
            auth_tag,
            key_version,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn auth_tag(&self) -> &[u8] {
        &self.auth_tag
    }

    pub fn key_version(&self) -> &KeyVersion {
        &self.key_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::from_parts(
            vec![1, 2, 3],
            vec![0; 12],
            vec![9; 16],
            KeyVersion::new("v1").unwrap(),
        )
    }

    #[test]
    fn serializes_binary_fields_as_base64() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["ciphertext"], "AQID");
        assert_eq!(json["nonce"], "AAAAAAAAAAAAAAAA");
        assert_eq!(json["key_version"], "v1");
    }

    #[test]
    fn json_roundtrip_preserves_all_fields() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{"ciphertext":"AQID","nonce":"AAAAAAAAAAAAAAAA","auth_tag":"CQkJCQkJCQkJCQkJCQkJCQ==","key_version":"v1","extra":1}"#;
        assert!(serde_json::from_str::<Envelope>(json).is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        let json = r#"{"ciphertext":"!!!","nonce":"AAAAAAAAAAAAAAAA","auth_tag":"CQkJCQkJCQkJCQkJCQkJCQ==","key_version":"v1"}"#;
        assert!(serde_json::from_str::<Envelope>(json).is_err());
    }
}
