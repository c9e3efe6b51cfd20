//! Persistent encryption key storage
//!
//! Obtains the preference-encryption key from the platform secret facility
//! (macOS Keychain, Windows Credential Manager, Linux Secret Service fronted
//! by the kernel keyring) via the keyring crate, creating it on first use.

use keyring::credential::CredentialBuilder;
use keyring::Entry;
use parking_lot::Mutex;
use thiserror::Error;

use super::secret_key::SecretKey;

/// Default keyring service name
pub const DEFAULT_SERVICE: &str = "WhichLogin";

/// Default keyring account holding the encryption key
pub const DEFAULT_ACCOUNT: &str = "WhichLoginEncryptionKey";

/// Errors that can occur while obtaining the encryption key
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// The platform secret facility could not be read or written
    #[error("Secret store unavailable: {0}")]
    SecretStoreUnavailable(String),

    /// An entry exists but does not hold a valid key
    #[error("Stored encryption key is invalid: {0}")]
    InvalidKey(String),
}

impl From<keyring::Error> for KeyStoreError {
    fn from(err: keyring::Error) -> Self {
        KeyStoreError::SecretStoreUnavailable(err.to_string())
    }
}

/// Source of the persistent symmetric key
///
/// Implementations must be idempotent: once a key has been created, every
/// later call, including from a restarted process, returns the same key.
#[cfg_attr(test, mockall::automock)]
pub trait KeyStore: Send + Sync {
    /// Returns the existing key, creating and persisting one if absent
    fn get_or_create_key(&self) -> Result<SecretKey, KeyStoreError>;
}

/// Key store backed by the OS credential manager
pub struct KeyringKeyStore {
    service: String,
    account: String,
    /// Overrides the platform default store when set
    builder: Option<Box<CredentialBuilder>>,
}

impl KeyringKeyStore {
    /// Creates a store with the default service and account names
    pub fn new() -> Self {
        Self::with_names(DEFAULT_SERVICE, DEFAULT_ACCOUNT)
    }

    /// Creates a store with custom names
    ///
    /// Useful for testing or separating profiles.
    pub fn with_names(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            builder: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_credential_builder(
        service: impl Into<String>,
        account: impl Into<String>,
        builder: Box<CredentialBuilder>,
    ) -> Self {
        Self {
            builder: Some(builder),
            ..Self::with_names(service, account)
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(&self) -> Result<Entry, KeyStoreError> {
        match &self.builder {
            Some(builder) => Ok(Entry::new_with_credential(builder.build(
                None,
                &self.service,
                &self.account,
            )?)),
            None => Ok(Entry::new(&self.service, &self.account)?),
        }
    }

    /// Reads the stored key
    ///
    /// Returns `None` if no entry exists yet.
    fn load(&self) -> Result<Option<SecretKey>, KeyStoreError> {
        match self.entry()?.get_password() {
            Ok(encoded) => SecretKey::from_base64(&encoded)
                .map(Some)
                .ok_or_else(|| KeyStoreError::InvalidKey("not a base64 256-bit key".into())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &SecretKey) -> Result<(), KeyStoreError> {
        self.entry()?.set_password(&key.to_base64())?;
        Ok(())
    }
}

impl Default for KeyringKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for KeyringKeyStore {
    fn get_or_create_key(&self) -> Result<SecretKey, KeyStoreError> {
        if let Some(key) = self.load()? {
            return Ok(key);
        }

        self.save(&SecretKey::generate())?;
        tracing::info!(
            "Created encryption key in keyring ({}/{})",
            self.service,
            self.account
        );

        // Read back so two processes racing on first use settle on
        // whichever key the keyring kept.
        self.load()?.ok_or_else(|| {
            KeyStoreError::SecretStoreUnavailable("key vanished after creation".into())
        })
    }
}

/// Process-local key store
///
/// Holds the key in memory only, so data encrypted with it does not survive
/// a restart. Intended for tests and for hosts without a secret facility.
#[derive(Default)]
pub struct MemoryKeyStore {
    key: Mutex<Option<SecretKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `key`
    pub fn with_key(key: SecretKey) -> Self {
        Self {
            key: Mutex::new(Some(key)),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn get_or_create_key(&self) -> Result<SecretKey, KeyStoreError> {
        let mut guard = self.key.lock();
        Ok(guard.get_or_insert_with(SecretKey::generate).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyring::credential::{
        Credential, CredentialApi, CredentialBuilderApi, CredentialPersistence,
    };
    use std::any::Any;
    use std::collections::HashMap;
    use std::sync::Arc;

    type Secrets = Arc<Mutex<HashMap<(String, String), Vec<u8>>>>;

    /// In-process credential store shared by every entry built from it
    #[derive(Debug, Default, Clone)]
    struct SharedStore {
        secrets: Secrets,
    }

    #[derive(Debug)]
    struct SharedCredential {
        id: (String, String),
        secrets: Secrets,
    }

    impl CredentialApi for SharedCredential {
        fn set_secret(&self, secret: &[u8]) -> keyring::Result<()> {
            self.secrets.lock().insert(self.id.clone(), secret.to_vec());
            Ok(())
        }

        fn get_secret(&self) -> keyring::Result<Vec<u8>> {
            self.secrets
                .lock()
                .get(&self.id)
                .cloned()
                .ok_or(keyring::Error::NoEntry)
        }

        fn delete_credential(&self) -> keyring::Result<()> {
            self.secrets
                .lock()
                .remove(&self.id)
                .map(|_| ())
                .ok_or(keyring::Error::NoEntry)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl CredentialBuilderApi for SharedStore {
        fn build(
            &self,
            _target: Option<&str>,
            service: &str,
            user: &str,
        ) -> keyring::Result<Box<Credential>> {
            Ok(Box::new(SharedCredential {
                id: (service.to_string(), user.to_string()),
                secrets: self.secrets.clone(),
            }))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn unique_service() -> String {
        format!("whichlogin-test-{}", uuid::Uuid::new_v4())
    }

    fn keyring_store(backing: &SharedStore, service: &str) -> KeyringKeyStore {
        KeyringKeyStore::with_credential_builder(
            service,
            DEFAULT_ACCOUNT,
            Box::new(backing.clone()),
        )
    }

    #[test]
    fn test_keyring_store_names() {
        let store = KeyringKeyStore::new();
        assert_eq!(store.service(), "WhichLogin");
        assert_eq!(store.account(), "WhichLoginEncryptionKey");

        let custom = KeyringKeyStore::with_names("Custom", "acct");
        assert_eq!(custom.service(), "Custom");
        assert_eq!(custom.account(), "acct");
    }

    #[test]
    fn test_default_keyring_survives_reboot() {
        let persistence = keyring::default::default_credential_builder().persistence();
        assert!(!matches!(
            persistence,
            CredentialPersistence::EntryOnly
                | CredentialPersistence::ProcessOnly
                | CredentialPersistence::UntilReboot
        ));
    }

    #[test]
    fn test_keyring_store_creates_once() {
        let backing = SharedStore::default();
        let service = unique_service();

        let first = keyring_store(&backing, &service);
        let created = first.get_or_create_key().unwrap();
        assert_eq!(first.get_or_create_key().unwrap(), created);

        // A fresh instance stands in for a restarted process
        let second = keyring_store(&backing, &service);
        assert_eq!(second.get_or_create_key().unwrap(), created);

        let stored = first.entry().unwrap().get_password().unwrap();
        assert_eq!(SecretKey::from_base64(&stored).unwrap(), created);

        first.entry().unwrap().delete_credential().unwrap();
        assert!(first.load().unwrap().is_none());
    }

    #[test]
    fn test_keyring_store_separates_services() {
        let backing = SharedStore::default();
        let a = keyring_store(&backing, &unique_service());
        let b = keyring_store(&backing, &unique_service());

        assert_ne!(a.get_or_create_key().unwrap(), b.get_or_create_key().unwrap());
    }

    #[test]
    fn test_keyring_store_rejects_garbage() {
        let backing = SharedStore::default();
        let store = keyring_store(&backing, &unique_service());
        store.entry().unwrap().set_password("not-a-key").unwrap();

        let err = store.get_or_create_key().unwrap_err();
        assert!(matches!(err, KeyStoreError::InvalidKey(_)));

        // The bad value is reported, never silently replaced
        assert_eq!(
            store.entry().unwrap().get_password().unwrap(),
            "not-a-key"
        );
    }

    #[test]
    #[ignore = "needs an unlocked OS keyring"]
    fn test_platform_keyring_roundtrip() {
        let service = unique_service();
        let store = KeyringKeyStore::with_names(service.as_str(), DEFAULT_ACCOUNT);
        let created = store.get_or_create_key().unwrap();

        let reopened = KeyringKeyStore::with_names(service.as_str(), DEFAULT_ACCOUNT);
        assert_eq!(reopened.get_or_create_key().unwrap(), created);

        store.entry().unwrap().delete_credential().unwrap();
    }

    #[test]
    fn test_memory_store_is_idempotent() {
        let store = MemoryKeyStore::new();
        let first = store.get_or_create_key().unwrap();
        let second = store.get_or_create_key().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_memory_store_with_key() {
        let key = SecretKey::from_bytes([3u8; 32]);
        let store = MemoryKeyStore::with_key(key.clone());
        assert_eq!(store.get_or_create_key().unwrap(), key);
    }

    #[test]
    fn test_mock_failure_surfaces() {
        let mut mock = MockKeyStore::new();
        mock.expect_get_or_create_key()
            .returning(|| Err(KeyStoreError::SecretStoreUnavailable("locked".into())));

        let err = mock.get_or_create_key().unwrap_err();
        assert!(matches!(err, KeyStoreError::SecretStoreUnavailable(_)));
        assert_eq!(err.to_string(), "Secret store unavailable: locked");
    }
}
