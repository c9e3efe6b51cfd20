//! Per-site login preference records
//!
//! A [`SitePreference`] remembers the last login method used on one
//! registrable domain plus a short history. Updates go through the pure
//! [`apply_login`] so the counter and history rules can be checked without
//! touching storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::method::LoginMethod;

/// Maximum number of history entries kept per site
pub const HISTORY_LIMIT: usize = 10;

/// One recorded login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub method: LoginMethod,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Creates an entry with a fresh id
    pub fn new(method: LoginMethod, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            timestamp,
        }
    }
}

/// The remembered login preference for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePreference {
    /// Stable identifier, used by edit and delete
    pub id: Uuid,
    /// Registrable domain (output of `DomainNormalizer::normalize`)
    pub site: String,
    /// Most recently used method
    pub last_method: LoginMethod,
    /// Oldest first, at most [`HISTORY_LIMIT`] entries
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub last_seen_at: DateTime<Utc>,
    /// Number of recorded logins, unaffected by history truncation
    pub times_seen: u64,
    /// Suppresses the hint for this site
    #[serde(default)]
    pub ignored: bool,
}

impl SitePreference {
    /// Creates the record for a site's first recorded login
    pub fn first_login(site: impl Into<String>, method: LoginMethod, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            site: site.into(),
            last_method: method,
            history: vec![HistoryEntry::new(method, now)],
            last_seen_at: now,
            times_seen: 1,
            ignored: false,
        }
    }

    /// Sets the ignored flag
    pub fn with_ignored(mut self, ignored: bool) -> Self {
        self.ignored = ignored;
        self
    }

    /// Drops the oldest history entries beyond [`HISTORY_LIMIT`]
    pub fn truncate_history(&mut self) {
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

/// Applies one login to an existing record, or creates the record
///
/// Pure: the input is consumed and the updated record returned. For an
/// existing record the method and timestamp are updated, the counter is
/// incremented and the history is appended then cut to the newest
/// [`HISTORY_LIMIT`] entries.
pub fn apply_login(
    existing: Option<SitePreference>,
    site: &str,
    method: LoginMethod,
    now: DateTime<Utc>,
) -> SitePreference {
    match existing {
        Some(mut pref) => {
            pref.last_method = method;
            pref.last_seen_at = now;
            pref.times_seen = pref.times_seen.saturating_add(1);
            pref.history.push(HistoryEntry::new(method, now));
            pref.truncate_history();
            pref
        }
        None => SitePreference::first_login(site, method, now),
    }
}
