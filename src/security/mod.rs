//! Security module - Key storage, blob encryption and input hygiene
//!
//! This module provides security primitives for:
//! - Obtaining the persistent encryption key from the OS secret store
//! - AES-256-GCM encryption of the preference blob
//! - Key material with zeroization
//! - Validating bridge input and redacting sites in logs

mod codec;
mod key_store;
mod sanitizer;
mod secret_key;

pub use codec::{BlobCodec, CodecError, NONCE_LEN, TAG_LEN};
pub use key_store::{
    KeyStore, KeyStoreError, KeyringKeyStore, MemoryKeyStore, DEFAULT_ACCOUNT, DEFAULT_SERVICE,
};
pub use sanitizer::{Sanitizer, SanitizerError, MAX_SITE_LEN};
pub use secret_key::{SecretKey, KEY_LEN};
