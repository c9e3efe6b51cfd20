//! Configuration management for WhichLogin
//!
//! Resolves where preferences and settings live on disk and which keyring
//! entry holds the encryption key. Supports Windows, macOS, and Linux.

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::security::{DEFAULT_ACCOUNT, DEFAULT_SERVICE};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "WHICHLOGIN_DATA_DIR";

/// Environment variable holding a log filter, checked before `RUST_LOG`
pub const LOG_ENV: &str = "WHICHLOGIN_LOG";

/// Filter used when neither log variable is set
pub const DEFAULT_LOG_FILTER: &str = "whichlogin=debug,info";

pub const PREFERENCES_FILE: &str = "site_preferences.enc";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine a data directory; set WHICHLOGIN_DATA_DIR")]
    NoDataDir,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding both persisted files
    pub data_dir: PathBuf,
    /// Encrypted preference table, relative to `data_dir`
    pub preferences_file: String,
    /// Plaintext settings, relative to `data_dir`
    pub settings_file: String,
    pub keyring_service: String,
    pub keyring_account: String,
}

impl AppConfig {
    /// Gets the per-user application directory (cross-platform)
    fn platform_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            env::var("APPDATA")
                .ok()
                .map(|p| PathBuf::from(p).join("WhichLogin"))
        }

        #[cfg(target_os = "macos")]
        {
            env::var("HOME")
                .ok()
                .map(|p| PathBuf::from(p).join("Library/Application Support/WhichLogin"))
        }

        #[cfg(target_os = "linux")]
        {
            env::var("XDG_CONFIG_HOME")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .or_else(|| env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
                .map(|p| p.join("whichlogin"))
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }

    fn resolve_data_dir(override_dir: Option<String>) -> Option<PathBuf> {
        override_dir
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .or_else(Self::platform_dir)
    }

    /// Loads configuration from the environment
    ///
    /// `WHICHLOGIN_DATA_DIR` wins over the platform directory.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir =
            Self::resolve_data_dir(env::var(DATA_DIR_ENV).ok()).ok_or(ConfigError::NoDataDir)?;
        Ok(Self::with_data_dir(data_dir))
    }

    /// Creates a configuration rooted at `data_dir` with default names
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            preferences_file: PREFERENCES_FILE.to_string(),
            settings_file: SETTINGS_FILE.to_string(),
            keyring_service: DEFAULT_SERVICE.to_string(),
            keyring_account: DEFAULT_ACCOUNT.to_string(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.preferences_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    /// Log filter directive from `WHICHLOGIN_LOG`, then `RUST_LOG`
    pub fn log_filter() -> String {
        env::var(LOG_ENV)
            .or_else(|_| env::var("RUST_LOG"))
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}
