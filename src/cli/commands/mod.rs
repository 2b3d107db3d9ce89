//! One module per subcommand, each exposing an `execute` function.

pub mod add;
pub mod delete;
pub mod edit;
pub mod export;
pub mod find;
pub mod get;
pub mod init;
pub mod keygen;
pub mod list;
pub mod project;
pub mod reencrypt;
pub mod reminders;
pub mod update;
pub mod versions;
