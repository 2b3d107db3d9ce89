pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod store;

mod serde_b64;
