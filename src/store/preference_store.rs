//! Encrypted local preference store
//!
//! Owns the table of [`SitePreference`] records (one per registrable domain)
//! and the [`AppSettings`] singleton. Every mutation is written through to
//! disk before it returns: preferences encrypted with [`BlobCodec`],
//! settings as plaintext JSON.
//!
//! # Concurrency
//!
//! All access goes through one mutex held across read-modify-write-persist,
//! so at most one mutation is in flight per store. Each write replaces the
//! whole file, so two *processes* writing the same data directory can lose
//! updates. Deployments must ensure a single writer at a time.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use super::persistence;
use super::snapshot::Snapshot;
use crate::config::AppConfig;
use crate::domain::DomainNormalizer;
use crate::models::{apply_login, AppSettings, LoginMethod, SettingsError, SitePreference};
use crate::security::{BlobCodec, CodecError, KeyStoreError, Sanitizer};

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The encryption key could not be obtained
    #[error(transparent)]
    SecretStore(#[from] KeyStoreError),

    /// Encryption or decryption failed
    #[error("Encryption error: {0}")]
    Encryption(CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Settings rejected by validation
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// Import document could not be used; nothing was changed
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// The record's site does not normalize to a host
    #[error("Invalid site: {0}")]
    InvalidSite(String),
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::SecretStore(e) => StoreError::SecretStore(e),
            other => StoreError::Encryption(other),
        }
    }
}

struct StoreState {
    preferences: BTreeMap<String, SitePreference>,
    settings: AppSettings,
}

/// Preference table and settings with write-through persistence
pub struct PreferenceStore {
    preferences_path: PathBuf,
    settings_path: PathBuf,
    codec: Arc<BlobCodec>,
    state: Mutex<StoreState>,
}

impl PreferenceStore {
    /// Opens the store, loading both files
    ///
    /// Missing, unreadable, corrupt or unauthenticated files fall back to an
    /// empty table or default settings. The one failure that propagates is
    /// a secret-store error while an encrypted file exists, since resetting
    /// then would let the next write destroy data under the real key.
    pub fn open(config: &AppConfig, codec: Arc<BlobCodec>) -> Result<Self, StoreError> {
        Self::open_paths(config.preferences_path(), config.settings_path(), codec)
    }

    /// Opens the store with explicit file locations
    pub fn open_paths(
        preferences_path: impl Into<PathBuf>,
        settings_path: impl Into<PathBuf>,
        codec: Arc<BlobCodec>,
    ) -> Result<Self, StoreError> {
        let preferences_path = preferences_path.into();
        let settings_path = settings_path.into();

        let preferences = load_preferences(&preferences_path, &codec)?;
        let settings = load_settings(&settings_path);

        tracing::info!("Loaded {} site preferences", preferences.len());

        Ok(Self {
            preferences_path,
            settings_path,
            codec,
            state: Mutex::new(StoreState {
                preferences,
                settings,
            }),
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Exact lookup by normalized site
    ///
    /// No normalization happens here; pass the output of
    /// [`DomainNormalizer::normalize`].
    pub fn get(&self, site: &str) -> Option<SitePreference> {
        self.state.lock().preferences.get(site).cloned()
    }

    /// All records, most recently seen first
    pub fn all(&self) -> Vec<SitePreference> {
        let state = self.state.lock();
        sorted_by_recency(state.preferences.values().cloned().collect())
    }

    /// Records whose site contains `query`, case-insensitively
    ///
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<SitePreference> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.all();
        }

        let state = self.state.lock();
        sorted_by_recency(
            state
                .preferences
                .values()
                .filter(|pref| pref.site.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.state.lock().preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().preferences.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Records a login on `site` now
    pub fn record_login(
        &self,
        site: &str,
        method: LoginMethod,
    ) -> Result<SitePreference, StoreError> {
        self.record_login_at(site, method, Utc::now())
    }

    /// Records a login on `site` at `now`
    ///
    /// Creates the record on first sight, otherwise updates method,
    /// timestamp, counter and history. The table is persisted before
    /// returning.
    pub fn record_login_at(
        &self,
        site: &str,
        method: LoginMethod,
        now: DateTime<Utc>,
    ) -> Result<SitePreference, StoreError> {
        let mut state = self.state.lock();
        let mut next = state.preferences.clone();

        let updated = apply_login(next.remove(site), site, method, now);
        next.insert(site.to_string(), updated.clone());

        self.persist_preferences(&next)?;
        state.preferences = next;

        tracing::debug!(
            "Recorded {} login on {} (seen {} times)",
            method,
            Sanitizer::redact_site(site),
            updated.times_seen
        );
        Ok(updated)
    }

    /// Replaces the record with the same id, or inserts it
    ///
    /// The site is normalized and the history cut to the newest entries.
    /// Another record already holding the same site is displaced. A site
    /// that normalizes to nothing is rejected and the table left unchanged.
    pub fn update(&self, mut pref: SitePreference) -> Result<(), StoreError> {
        let site = DomainNormalizer::normalize(&pref.site);
        if site.is_empty() {
            return Err(StoreError::InvalidSite("no host left after normalization".into()));
        }
        pref.site = site;
        pref.truncate_history();

        let mut state = self.state.lock();
        let mut next = state.preferences.clone();
        next.retain(|_, existing| existing.id != pref.id);
        next.insert(pref.site.clone(), pref);

        self.persist_preferences(&next)?;
        state.preferences = next;
        Ok(())
    }

    /// Removes the record with `id`
    ///
    /// Returns `false` and writes nothing if no record has that id.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        let Some(site) = state
            .preferences
            .values()
            .find(|pref| pref.id == id)
            .map(|pref| pref.site.clone())
        else {
            return Ok(false);
        };

        let mut next = state.preferences.clone();
        next.remove(&site);

        self.persist_preferences(&next)?;
        state.preferences = next;

        tracing::debug!("Deleted preference for {}", Sanitizer::redact_site(&site));
        Ok(true)
    }

    /// Empties the table
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let next = BTreeMap::new();

        self.persist_preferences(&next)?;
        state.preferences = next;

        tracing::info!("Cleared all site preferences");
        Ok(())
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn settings(&self) -> AppSettings {
        self.state.lock().settings.clone()
    }

    /// Validates and replaces the settings
    pub fn update_settings(&self, settings: AppSettings) -> Result<(), StoreError> {
        settings.validate()?;

        let mut state = self.state.lock();
        self.persist_settings(&settings)?;
        state.settings = settings;
        Ok(())
    }

    // ========================================================================
    // Export / import
    // ========================================================================

    /// Exports the table and settings as one JSON document
    pub fn export_json(&self) -> Result<Vec<u8>, StoreError> {
        let state = self.state.lock();
        Snapshot::new(
            sorted_by_recency(state.preferences.values().cloned().collect()),
            state.settings.clone(),
        )
        .to_json()
    }

    /// Replaces the table and settings from an exported document
    ///
    /// Sites are re-normalized and duplicates collapse to the most recently
    /// seen record. An invalid document changes nothing.
    pub fn import_json(&self, data: &[u8]) -> Result<(), StoreError> {
        let snapshot = Snapshot::from_json(data)?;
        let preferences = index_preferences(snapshot.preferences);

        let mut state = self.state.lock();
        self.persist_preferences(&preferences)?;
        self.persist_settings(&snapshot.settings)?;

        tracing::info!("Imported {} site preferences", preferences.len());
        state.preferences = preferences;
        state.settings = snapshot.settings;
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Encrypts and writes the table
    ///
    /// Key and encryption failures propagate. A failed file write is logged
    /// and swallowed; the caller still commits the in-memory change.
    fn persist_preferences(
        &self,
        preferences: &BTreeMap<String, SitePreference>,
    ) -> Result<(), StoreError> {
        let records: Vec<&SitePreference> = preferences.values().collect();
        let plaintext = serde_json::to_vec(&records)?;
        let blob = self.codec.encrypt(&plaintext)?;

        write_best_effort(&self.preferences_path, &blob);
        Ok(())
    }

    fn persist_settings(&self, settings: &AppSettings) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(settings)?;
        write_best_effort(&self.settings_path, &data);
        Ok(())
    }
}

fn write_best_effort(path: &Path, data: &[u8]) {
    match persistence::write_atomic(path, data) {
        Ok(()) => tracing::debug!("Saved {} ({} bytes)", path.display(), data.len()),
        Err(e) => tracing::error!("Failed to write {}: {}", path.display(), e),
    }
}

fn load_preferences(
    path: &Path,
    codec: &BlobCodec,
) -> Result<BTreeMap<String, SitePreference>, StoreError> {
    let blob = match persistence::read_optional(path) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            tracing::debug!("No preferences file at {}", path.display());
            return Ok(BTreeMap::new());
        }
        Err(e) => {
            tracing::warn!("Could not read {}, starting empty: {}", path.display(), e);
            return Ok(BTreeMap::new());
        }
    };

    let plaintext = match codec.decrypt(&blob) {
        Ok(plaintext) => plaintext,
        Err(CodecError::SecretStore(e)) => return Err(StoreError::SecretStore(e)),
        Err(e) => {
            tracing::warn!("Could not decrypt preferences, starting empty: {}", e);
            return Ok(BTreeMap::new());
        }
    };

    match serde_json::from_slice::<Vec<SitePreference>>(&plaintext) {
        Ok(records) => Ok(index_preferences(records)),
        Err(e) => {
            tracing::warn!("Could not parse preferences, starting empty: {}", e);
            Ok(BTreeMap::new())
        }
    }
}

fn load_settings(path: &Path) -> AppSettings {
    let data = match persistence::read_optional(path) {
        Ok(Some(data)) => data,
        Ok(None) => return AppSettings::default(),
        Err(e) => {
            tracing::warn!("Could not read {}, using defaults: {}", path.display(), e);
            return AppSettings::default();
        }
    };

    match serde_json::from_slice::<AppSettings>(&data) {
        Ok(settings) if settings.validate().is_ok() => settings,
        Ok(_) => {
            tracing::warn!("Stored settings are invalid, using defaults");
            AppSettings::default()
        }
        Err(e) => {
            tracing::warn!("Could not parse settings, using defaults: {}", e);
            AppSettings::default()
        }
    }
}

/// Keys records by normalized site, one per site
///
/// Histories are truncated and, for duplicate sites, the most recently seen
/// record wins. Records whose site normalizes to nothing are dropped.
fn index_preferences(records: Vec<SitePreference>) -> BTreeMap<String, SitePreference> {
    let mut table: BTreeMap<String, SitePreference> = BTreeMap::new();

    for mut pref in records {
        pref.site = DomainNormalizer::normalize(&pref.site);
        if pref.site.is_empty() {
            continue;
        }
        pref.truncate_history();

        match table.get(&pref.site) {
            Some(existing) if existing.last_seen_at >= pref.last_seen_at => {}
            _ => {
                table.insert(pref.site.clone(), pref);
            }
        }
    }

    table
}

fn sorted_by_recency(mut records: Vec<SitePreference>) -> Vec<SitePreference> {
    records.sort_by(|a, b| {
        b.last_seen_at
            .cmp(&a.last_seen_at)
            .then_with(|| a.site.cmp(&b.site))
    });
    records
}
