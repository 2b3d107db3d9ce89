//! Store module — projects and encrypted API key records.
//!
//! This module provides:
//! - `Project`, `ApiKeyRecord`, and related types (`records`)
//! - Binary store file format with HMAC integrity (`format`)
//! - `.env` / JSON export and value masking (`export`)
//! - High-level `RecordStore` for managing projects and keys (`record_store`)

pub mod export;
pub mod format;
pub mod record_store;
pub mod records;

// Re-export the most commonly used items.
pub use export::{mask_value, ExportFormat};
pub use format::StoreHeader;
pub use record_store::RecordStore;
pub use records::{
    ApiKeyMetadata, ApiKeyRecord, Environment, KeyDetailsUpdate, NewApiKey, Project,
    ProjectSummary, ReminderEntry, RotationReminder, RotationStatus,
};
