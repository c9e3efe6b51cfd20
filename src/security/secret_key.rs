//! Symmetric key material with automatic memory zeroization
//!
//! Holds the 256-bit preference-encryption key. The bytes are wiped when the
//! value is dropped and never appear in `Debug` output.

use std::fmt;

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::{engine::general_purpose, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key that securely clears its memory when dropped
///
/// # Example
///
/// ```
/// use whichlogin::security::SecretKey;
///
/// let key = SecretKey::generate();
/// let encoded = key.to_base64();
/// let decoded = SecretKey::from_base64(&encoded).unwrap();
/// assert_eq!(key, decoded);
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_LEN],
}

impl SecretKey {
    /// Generates a fresh random key from the OS CSPRNG
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Copies a key out of a slice, or `None` if the length is wrong
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Decodes a standard-base64 key, or `None` if malformed
    pub fn from_base64(encoded: &str) -> Option<Self> {
        let mut decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    /// Encodes the key as standard base64
    ///
    /// The returned string holds key material; callers should not log it.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &KEY_LEN)
            .field("content", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for SecretKey {}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
