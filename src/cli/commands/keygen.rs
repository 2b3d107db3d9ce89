//! `keystash keygen` — print a fresh random 256-bit key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::KEY_LEN;
use crate::errors::Result;

/// Execute the `keygen` command.
pub fn execute(as_hex: bool) -> Result<()> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rand::rng().fill_bytes(key.as_mut_slice());

    let encoded = Zeroizing::new(if as_hex {
        hex::encode(key.as_slice())
    } else {
        STANDARD.encode(key.as_slice())
    });
    // Only the key goes to stdout so `$(keystash keygen)` captures it cleanly.
    println!("{}", encoded.as_str());
    Ok(())
}
