//! Project and API key records kept in the store.
//!
//! A record owns its [`Envelope`]: the envelope is created with the record,
//! replaced wholesale when the value changes, and deleted with it.  No
//! field of a record ever holds plaintext.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{Envelope, KeyVersion, LookupToken};
use crate::errors::{KeystashError, Result};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Deployment environment a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = KeystashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(KeystashError::InvalidInput(format!(
                "unknown environment '{other}' — use development, staging, or production"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RotationReminder
// ---------------------------------------------------------------------------

/// How often a key should be rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationReminder {
    #[serde(rename = "30")]
    Days30,
    #[serde(rename = "60")]
    Days60,
    #[serde(rename = "90")]
    Days90,
    #[serde(rename = "180")]
    Days180,
    #[serde(rename = "none")]
    Never,
}

impl RotationReminder {
    /// Rotation interval in days, or `None` when no reminder is set.
    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Days30 => Some(30),
            Self::Days60 => Some(60),
            Self::Days90 => Some(90),
            Self::Days180 => Some(180),
            Self::Never => None,
        }
    }

    /// Where a key stands relative to its rotation deadline.
    ///
    /// `since` is the last rotation, or the creation time for keys that
    /// were never rotated.
    pub fn status(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        warning_days: u32,
    ) -> RotationStatus {
        let Some(days) = self.days() else {
            return RotationStatus::NotScheduled;
        };

        let due = since + Duration::days(days);
        if now >= due {
            return RotationStatus::Overdue {
                days_over: (now - due).num_days(),
            };
        }

        let days_left = (due - now).num_days();
        if days_left < i64::from(warning_days) {
            RotationStatus::DueSoon { days_left }
        } else {
            RotationStatus::Ok { days_left }
        }
    }
}

impl fmt::Display for RotationReminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.days() {
            Some(d) => write!(f, "{d} days"),
            None => f.write_str("none"),
        }
    }
}

impl FromStr for RotationReminder {
    type Err = KeystashError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        // A day suffix is allowed once, and only after a number.
        let (number, has_suffix) = match normalized
            .strip_suffix("days")
            .or_else(|| normalized.strip_suffix('d'))
        {
            Some(rest) => (rest.trim(), true),
            None => (normalized.as_str(), false),
        };
        match (number, has_suffix) {
            ("30", _) => Ok(Self::Days30),
            ("60", _) => Ok(Self::Days60),
            ("90", _) => Ok(Self::Days90),
            ("180", _) => Ok(Self::Days180),
            ("none" | "never" | "off", false) => Ok(Self::Never),
            _ => Err(KeystashError::InvalidInput(format!(
                "unknown rotation reminder '{s}' — use 30, 60, 90, 180, or none"
            ))),
        }
    }
}

/// Result of checking a key against its rotation reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    NotScheduled,
    Ok { days_left: i64 },
    DueSoon { days_left: i64 },
    Overdue { days_over: i64 },
}

impl RotationStatus {
    /// Returns `true` for keys that need attention.
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::DueSoon { .. } | Self::Overdue { .. })
    }

    /// Sort key: most urgent first.
    pub(crate) fn urgency(&self) -> i64 {
        match *self {
            Self::Overdue { days_over } => -days_over,
            Self::DueSoon { days_left } | Self::Ok { days_left } => days_left + 1,
            Self::NotScheduled => i64::MAX,
        }
    }
}

impl fmt::Display for RotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotScheduled => f.write_str("no reminder"),
            Self::Ok { days_left } => write!(f, "ok ({days_left}d left)"),
            Self::DueSoon { days_left } => write!(f, "due in {days_left}d"),
            Self::Overdue { days_over } => write!(f, "overdue by {days_over}d"),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A named group of API keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored API key.  The value exists only inside `envelope`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub service: String,
    pub environment: Environment,
    pub envelope: Envelope,
    pub lookup_token: LookupToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub rotation_reminder: RotationReminder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rotated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// Start of the current rotation period.
    pub fn rotation_anchor(&self) -> DateTime<Utc> {
        self.last_rotated.unwrap_or(self.created_at)
    }
}

/// Input for creating a key.
#[derive(Debug, Clone)]
pub struct NewApiKey<'a> {
    pub name: &'a str,
    pub service: &'a str,
    pub environment: Environment,
    pub value: &'a str,
    pub notes: Option<&'a str>,
    pub rotation_reminder: RotationReminder,
}

/// Changes to a key's descriptive fields.
///
/// Closed on purpose: the envelope and lookup token are never reachable
/// from here, only through `RecordStore::update_value`.  An empty `notes`
/// string clears the notes.
#[derive(Debug, Clone, Default)]
pub struct KeyDetailsUpdate {
    pub name: Option<String>,
    pub service: Option<String>,
    pub environment: Option<Environment>,
    pub notes: Option<String>,
    pub rotation_reminder: Option<RotationReminder>,
}

impl KeyDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.service.is_none()
            && self.environment.is_none()
            && self.notes.is_none()
            && self.rotation_reminder.is_none()
    }
}

/// Metadata about a key, without its envelope.
///
/// Returned by listing operations so callers can display keys without
/// touching any ciphertext.
#[derive(Debug, Clone)]
pub struct ApiKeyMetadata {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub service: String,
    pub environment: Environment,
    pub key_version: KeyVersion,
    pub notes: Option<String>,
    pub rotation_reminder: RotationReminder,
    pub last_rotated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ApiKeyRecord> for ApiKeyMetadata {
    fn from(r: &ApiKeyRecord) -> Self {
        Self {
            id: r.id,
            project_id: r.project_id,
            name: r.name.clone(),
            service: r.service.clone(),
            environment: r.environment,
            key_version: r.envelope.key_version().clone(),
            notes: r.notes.clone(),
            rotation_reminder: r.rotation_reminder,
            last_rotated: r.last_rotated,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A project together with how many keys it holds.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project: Project,
    pub key_count: usize,
}

/// A key whose rotation reminder needs attention.
#[derive(Debug, Clone)]
pub struct ReminderEntry {
    pub key: ApiKeyMetadata,
    pub status: RotationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn reminder_parses_various_spellings() {
        assert_eq!("30".parse::<RotationReminder>().unwrap(), RotationReminder::Days30);
        assert_eq!("90 days".parse::<RotationReminder>().unwrap(), RotationReminder::Days90);
        assert_eq!("180d".parse::<RotationReminder>().unwrap(), RotationReminder::Days180);
        assert_eq!("None".parse::<RotationReminder>().unwrap(), RotationReminder::Never);
        assert!("45".parse::<RotationReminder>().is_err());
    }

    #[test]
    fn reminder_suffix_is_stripped_once() {
        for bad in ["30dd", "90daysdays", "nonedays", "days", "d"] {
            assert!(
                bad.parse::<RotationReminder>().is_err(),
                "'{bad}' should be rejected"
            );
        }
        assert_eq!("60d".parse::<RotationReminder>().unwrap(), RotationReminder::Days60);
    }

    #[test]
    fn reminder_serializes_as_day_strings() {
        assert_eq!(serde_json::to_string(&RotationReminder::Days60).unwrap(), "\"60\"");
        assert_eq!(serde_json::to_string(&RotationReminder::Never).unwrap(), "\"none\"");
    }

    #[test]
    fn status_without_reminder_is_not_scheduled() {
        assert_eq!(
            RotationReminder::Never.status(at(1), at(30), 7),
            RotationStatus::NotScheduled
        );
    }

    #[test]
    fn status_ok_then_due_soon_then_overdue() {
        let r = RotationReminder::Days30;
        // Due on Jan 31.
        assert_eq!(r.status(at(1), at(2), 7), RotationStatus::Ok { days_left: 29 });
        assert_eq!(r.status(at(1), at(27), 7), RotationStatus::DueSoon { days_left: 4 });
        assert_eq!(r.status(at(1), at(31), 7), RotationStatus::Overdue { days_over: 0 });
    }

    #[test]
    fn urgency_orders_overdue_first() {
        let overdue = RotationStatus::Overdue { days_over: 3 };
        let soon = RotationStatus::DueSoon { days_left: 2 };
        assert!(overdue.urgency() < soon.urgency());
        assert!(overdue.needs_attention());
        assert!(!RotationStatus::Ok { days_left: 20 }.needs_attention());
    }
}
