use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Keystash.
#[derive(Debug, Error)]
pub enum KeystashError {
    // --- Codec errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Tag verification failed. Carries no detail on purpose: the cause
    /// (tamper, wrong key, truncated record) must not leak to callers.
    #[error("Authentication failed — secret cannot be read")]
    AuthenticationFailed,

    #[error("No master key configured for key version '{0}'")]
    KeyNotFound(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid key version: {0}")]
    InvalidKeyVersion(String),

    #[error("Key ring error: {0}")]
    KeyRingError(String),

    // --- Config errors ---
    #[error("Missing required configuration: {0} is not set")]
    MissingConfig(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    // --- Store errors ---
    #[error("Store not found at {0}")]
    StoreNotFound(PathBuf),

    #[error("Store already exists at {0}")]
    StoreAlreadyExists(PathBuf),

    #[error("Invalid store format: {0}")]
    InvalidStoreFormat(String),

    #[error("HMAC verification failed — store file may be tampered")]
    HmacMismatch,

    #[error("HMAC error: {0}")]
    HmacError(String),

    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Project '{0}' already exists")]
    ProjectAlreadyExists(String),

    #[error("API key '{0}' not found")]
    ApiKeyNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),
}

impl KeystashError {
    /// Returns `true` for failures raised by the envelope codec.
    ///
    /// The CLI collapses all of these into one generic message so that
    /// cipher internals never reach the terminal.
    pub fn is_codec_failure(&self) -> bool {
        matches!(
            self,
            Self::EncryptionFailed(_) | Self::AuthenticationFailed | Self::KeyNotFound(_)
        )
    }
}

/// Convenience type alias for Keystash results.
pub type Result<T> = std::result::Result<T, KeystashError>;
