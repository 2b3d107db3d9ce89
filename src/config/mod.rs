//! Configuration: non-secret settings from `keystash.toml` (`settings`)
//! and key material from the environment (`keys`).

pub mod keys;
pub mod settings;

pub use keys::KeyConfig;
pub use settings::Settings;
