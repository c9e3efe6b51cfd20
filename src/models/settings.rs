//! User-facing hint settings
//!
//! Singleton record read by the browser extension to decide whether and
//! where to show the "you last signed in with ..." hint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`AppSettings::validate`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// Hint timeout must be positive
    #[error("hintTimeoutMs must be greater than zero")]
    ZeroTimeout,

    /// Language tag must not be blank
    #[error("language must not be empty")]
    EmptyLanguage,
}

/// Screen corner for the hint popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl HintPosition {
    pub const ALL: [HintPosition; 4] = [
        HintPosition::BottomRight,
        HintPosition::BottomLeft,
        HintPosition::TopRight,
        HintPosition::TopLeft,
    ];

    /// Returns the wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            HintPosition::BottomRight => "bottom_right",
            HintPosition::BottomLeft => "bottom_left",
            HintPosition::TopRight => "top_right",
            HintPosition::TopLeft => "top_left",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            HintPosition::BottomRight => "Bottom Right",
            HintPosition::BottomLeft => "Bottom Left",
            HintPosition::TopRight => "Top Right",
            HintPosition::TopLeft => "Top Left",
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Show hints on login pages
    #[serde(default = "default_show_hint")]
    pub show_hint: bool,
    #[serde(default)]
    pub hint_position: HintPosition,
    /// How long the content script keeps the hint on screen
    #[serde(default = "default_hint_timeout_ms")]
    pub hint_timeout_ms: u32,
    /// Locale tag, e.g. "en-GB"
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_show_hint() -> bool {
    true
}

fn default_hint_timeout_ms() -> u32 {
    6000
}

fn default_language() -> String {
    "en-GB".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            show_hint: default_show_hint(),
            hint_position: HintPosition::default(),
            hint_timeout_ms: default_hint_timeout_ms(),
            language: default_language(),
        }
    }
}

impl AppSettings {
    /// Checks the invariants the extension relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.hint_timeout_ms == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        if self.language.trim().is_empty() {
            return Err(SettingsError::EmptyLanguage);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert!(settings.show_hint);
        assert_eq!(settings.hint_position, HintPosition::BottomRight);
        assert_eq!(settings.hint_timeout_ms, 6000);
        assert_eq!(settings.language, "en-GB");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize() {
        let settings = AppSettings {
            show_hint: false,
            hint_position: HintPosition::TopLeft,
            hint_timeout_ms: 2500,
            language: "fr-FR".to_string(),
        };

        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"hintPosition\":\"top_left\""));
        assert!(json.contains("\"hintTimeoutMs\":2500"));

        let loaded: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let loaded: AppSettings = serde_json::from_str(r#"{"showHint":false}"#).unwrap();
        assert!(!loaded.show_hint);
        assert_eq!(loaded.hint_timeout_ms, 6000);
        assert_eq!(loaded.language, "en-GB");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = AppSettings::default();
        settings.hint_timeout_ms = 0;
        assert_eq!(settings.validate(), Err(SettingsError::ZeroTimeout));

        let mut settings = AppSettings::default();
        settings.language = "  ".to_string();
        assert_eq!(settings.validate(), Err(SettingsError::EmptyLanguage));
    }

    #[test]
    fn test_position_tags() {
        for position in HintPosition::ALL {
            let json = serde_json::to_string(&position).unwrap();
            assert_eq!(json, format!("\"{}\"", position.as_str()));
        }
        assert_eq!(HintPosition::TopRight.display_name(), "Top Right");
    }
}
