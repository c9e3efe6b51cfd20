//! WhichLogin - Remember how you signed in to each website
//!
//! Keeps, per registrable domain, the login method last used there (Google,
//! Apple, email and password, ...) so the browser extension can remind you on
//! the next visit.
//!
//! ## Features
//!
//! - Canonical per-site keys (`app.notion.so` and `www.notion.so` share `notion.so`)
//! - Preference table encrypted at rest with AES-256-GCM
//! - Encryption key held in the OS keyring (macOS Keychain, Windows Credential Manager, Linux Secret Service)
//! - Crash-safe write-through persistence
//! - Native-messaging host for the browser extension
//!
//! ## Architecture
//!
//! - **Domain**: site normalization and OAuth provider detection
//! - **Models**: login methods, site preferences, settings
//! - **Security**: key storage, blob encryption, input validation
//! - **Store**: the persisted preference table and settings
//! - **Bridge**: the extension-facing protocol and its stdio transport

pub mod bridge;
pub mod config;
pub mod domain;
pub mod models;
pub mod security;
pub mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bridge::MessageBridge;
use config::AppConfig;
use security::{BlobCodec, KeyStore, KeyringKeyStore};
use store::{PreferenceStore, StoreError};

/// Application state shared by every entry point
///
/// One instance per process. The UI and the extension bridge both go
/// through the same [`PreferenceStore`].
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<PreferenceStore>,
    pub bridge: Arc<MessageBridge>,
}

impl AppState {
    /// Opens the store using the OS keyring named in `config`
    pub fn open(config: AppConfig) -> Result<Self, StoreError> {
        let key_store = Arc::new(KeyringKeyStore::with_names(
            config.keyring_service.clone(),
            config.keyring_account.clone(),
        ));
        Self::open_with_key_store(config, key_store)
    }

    /// Opens the store with a caller-supplied key source
    pub fn open_with_key_store(
        config: AppConfig,
        key_store: Arc<dyn KeyStore>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Opening WhichLogin data in {}", config.data_dir().display());

        let codec = Arc::new(BlobCodec::new(key_store));
        let store = Arc::new(PreferenceStore::open(&config, codec)?);
        let bridge = Arc::new(MessageBridge::new(store.clone()));

        Ok(Self {
            config,
            store,
            bridge,
        })
    }

    /// Releases the state
    ///
    /// Every mutation was already written through, so there is nothing to
    /// flush.
    pub fn shutdown(self) {
        tracing::info!("Shutting down with {} site preferences", self.store.len());
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Installs the global tracing subscriber, writing to stderr
///
/// The filter comes from `WHICHLOGIN_LOG`, then `RUST_LOG`, then
/// `whichlogin=debug,info`. Calling this twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_new(AppConfig::log_filter())
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
