//! Cryptographic core of Keystash.
//!
//! This module provides:
//! - AES-256-GCM seal/open with a detached tag (`encryption`)
//! - Random nonce generation behind a swappable source (`nonce`)
//! - The persisted `Envelope` format (`envelope`)
//! - Master keys, key versions, the key ring, and the index key (`keys`)
//! - HMAC lookup tokens (`token`)
//! - The `EnvelopeCodec` tying all of the above together (`codec`)

pub mod codec;
pub mod encryption;
pub mod envelope;
pub mod keys;
pub mod nonce;
pub mod token;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{EnvelopeCodec, Envelope, KeyRing, ...};
pub use codec::EnvelopeCodec;
pub use encryption::{NONCE_LEN, TAG_LEN};
pub use envelope::Envelope;
pub use keys::{IndexKey, KeyRing, KeyVersion, MasterKey, KEY_LEN};
pub use nonce::{NonceSource, SystemRandom};
pub use token::LookupToken;
