//! Authenticated encryption of opaque blobs
//!
//! AES-256-GCM with a fresh random 96-bit nonce per call. Blob layout:
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! Decryption is fail-closed: a blob that does not authenticate yields an
//! error and no plaintext.

use std::sync::Arc;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use parking_lot::Mutex;
use thiserror::Error;

use super::key_store::{KeyStore, KeyStoreError};
use super::secret_key::SecretKey;

/// Nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Errors that can occur during blob encryption or decryption
#[derive(Debug, Error)]
pub enum CodecError {
    /// The key could not be obtained; fatal to every codec operation
    #[error(transparent)]
    SecretStore(#[from] KeyStoreError),

    /// Tag did not verify: tampered, corrupt, or encrypted under another key
    #[error("Authentication failed: blob is corrupt or was encrypted with a different key")]
    AuthenticationFailure,

    /// Blob is shorter than nonce plus tag
    #[error("Blob too short: {0} bytes")]
    Truncated(usize),

    #[error("Encryption failed")]
    EncryptionFailed,
}

/// AEAD codec keyed by a [`KeyStore`]
///
/// The key is fetched on first use and cached for the codec's lifetime.
pub struct BlobCodec {
    key_store: Arc<dyn KeyStore>,
    key: Mutex<Option<SecretKey>>,
}

impl BlobCodec {
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self {
            key_store,
            key: Mutex::new(None),
        }
    }

    fn cipher(&self) -> Result<Aes256Gcm, CodecError> {
        let mut cached = self.key.lock();
        let key = match &*cached {
            Some(key) => key.clone(),
            None => {
                let key = self.key_store.get_or_create_key()?;
                *cached = Some(key.clone());
                key
            }
        };
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes())))
    }

    /// Encrypts `plaintext` under a fresh nonce
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CodecError::EncryptionFailed)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Verifies and decrypts a blob produced by [`BlobCodec::encrypt`]
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CodecError> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(CodecError::Truncated(blob.len()));
        }

        let cipher = self.cipher()?;
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CodecError::AuthenticationFailure)
    }
}
