//! Bridge responses
//!
//! Serialized untagged, so each variant is exactly the JSON object the
//! extension expects.

use serde::Serialize;

use crate::models::{AppSettings, HintPosition, LoginMethod, SitePreference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    /// `{found: true, site, method, ignored}`
    Preference {
        found: bool,
        site: String,
        method: LoginMethod,
        ignored: bool,
    },
    /// `{found: false}`
    NotFound { found: bool },
    /// `{success: true}`
    Success { success: bool },
    /// `{showHint, hintPosition, hintTimeoutMs}`
    #[serde(rename_all = "camelCase")]
    Settings {
        show_hint: bool,
        hint_position: HintPosition,
        hint_timeout_ms: u32,
    },
    /// `{error: "..."}`
    Error { error: String },
}

impl BridgeResponse {
    pub fn preference(pref: &SitePreference) -> Self {
        BridgeResponse::Preference {
            found: true,
            site: pref.site.clone(),
            method: pref.last_method,
            ignored: pref.ignored,
        }
    }

    pub fn not_found() -> Self {
        BridgeResponse::NotFound { found: false }
    }

    pub fn success() -> Self {
        BridgeResponse::Success { success: true }
    }

    pub fn settings(settings: &AppSettings) -> Self {
        BridgeResponse::Settings {
            show_hint: settings.show_hint,
            hint_position: settings.hint_position,
            hint_timeout_ms: settings.hint_timeout_ms,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        BridgeResponse::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BridgeResponse::Error { .. })
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Every variant is a plain object of strings, bools and numbers
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
