//! Session key lifecycle.
//!
//! A [`SessionKey`] is derived from the login password at authentication
//! and held only in process memory.  The process holds at most one
//! session key at a time, inside a [`KeyManager`].  The key buffer is
//! actively overwritten with zeroes when the session ends — on logout,
//! lock, recovery rotation, or process exit — never left for the
//! allocator to reclaim whenever it pleases.

use std::sync::Mutex;

use zeroize::Zeroize;

use super::cipher::{self, EncryptedField};
use super::kdf;
use crate::errors::{Result, VaultError};

/// A 32-byte symmetric session key that zeroes its memory on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SessionKey {
    bytes: [u8; kdf::KEY_LEN],
}

impl SessionKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; kdf::KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; kdf::KEY_LEN] {
        &self.bytes
    }
}

/// Holds the ephemeral session key and performs all field encryption.
///
/// The key lives in a single mutex-guarded cell.  `encrypt` and
/// `decrypt` hold the lock for the duration of one complete field
/// operation, so a `clear` racing in from another context (logout, lock)
/// can never release the key out from under an in-flight operation.
pub struct KeyManager {
    key: Mutex<Option<SessionKey>>,
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyManager {
    /// Create a manager with no key derived.
    pub fn new() -> Self {
        Self {
            key: Mutex::new(None),
        }
    }

    /// Derive a session key from `password` + `salt` and install it.
    ///
    /// This is the only sanctioned way to obtain a session key.  Any
    /// previously held key is dropped (and zeroized) first.
    pub fn derive_key(&self, password: &[u8], salt: &[u8]) {
        let mut bytes = kdf::derive_key(password, salt);
        let key = SessionKey::new(bytes);
        bytes.zeroize();

        let mut guard = self.lock();
        *guard = Some(key);
    }

    /// Destroy the held key.  Safe to call when no key is held.
    pub fn clear(&self) {
        let mut guard = self.lock();
        // Dropping the SessionKey zeroizes the buffer.
        *guard = None;
    }

    /// Whether encryption operations are currently possible.
    pub fn is_derived(&self) -> bool {
        self.lock().is_some()
    }

    /// Encrypt `plaintext` under the held session key.
    ///
    /// Fails with `KeyNotDerived` when no session is active.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedField> {
        let guard = self.lock();
        let key = guard.as_ref().ok_or(VaultError::KeyNotDerived)?;
        cipher::encrypt(key.as_bytes(), plaintext)
    }

    /// Decrypt a field encrypted under the held session key.
    ///
    /// Fails with `KeyNotDerived` when no session is active, and with
    /// `CipherFailure` on tag mismatch.  Cipher failures are never
    /// retried here — silent retry after a tag failure would mask
    /// tampering.
    pub fn decrypt(&self, field: &EncryptedField) -> Result<Vec<u8>> {
        let guard = self.lock();
        let key = guard.as_ref().ok_or(VaultError::KeyNotDerived)?;
        cipher::decrypt(key.as_bytes(), field)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SessionKey>> {
        // A poisoned lock means another thread panicked mid-operation;
        // the key cell itself is still just an Option, so continue.
        self.key.lock().unwrap_or_else(|e| e.into_inner())
    }
}
