//! Bulk export/import document
//!
//! A snapshot is the whole preference table plus the settings singleton,
//! produced and consumed wholesale:
//!
//! ```json
//! {
//!   "preferences": [ { "site": "example.com", "lastMethod": "google", ... } ],
//!   "settings": { "showHint": true, "hintPosition": "bottom_right", ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::preference_store::StoreError;
use crate::models::{AppSettings, SitePreference};

/// Exported state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub preferences: Vec<SitePreference>,
    #[serde(default)]
    pub settings: AppSettings,
}

impl Snapshot {
    pub fn new(preferences: Vec<SitePreference>, settings: AppSettings) -> Self {
        Self {
            preferences,
            settings,
        }
    }

    /// Serializes as pretty-printed JSON
    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parses and validates an imported document
    ///
    /// Any problem is reported as [`StoreError::InvalidImport`] so the caller
    /// can reject the import without touching current state.
    pub fn from_json(data: &[u8]) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_slice(data)
            .map_err(|e| StoreError::InvalidImport(e.to_string()))?;

        snapshot
            .settings
            .validate()
            .map_err(|e| StoreError::InvalidImport(e.to_string()))?;

        Ok(snapshot)
    }
}
