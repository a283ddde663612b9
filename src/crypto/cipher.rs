//! AES-256-GCM authenticated encryption of individual field values.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.  A tag mismatch (tampered data, wrong key) is
//! reported as a single opaque `CipherFailure` — the error never says
//! *why* authentication failed.
//!
//! Layout of an [`EncryptedField`]:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// An opaque encrypted field value: nonce, ciphertext, and auth tag in
/// one blob, transported as base64.
///
/// The nonce is generated fresh for every encryption; the same nonce is
/// never reused with the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField(Vec<u8>);

impl EncryptedField {
    /// Wrap raw `nonce || ciphertext || tag` bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw `nonce || ciphertext || tag` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encode for transport/storage.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Decode from a base64 string produced by `to_base64`.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|_| VaultError::CipherFailure)?;
        Ok(Self(bytes))
    }
}

impl serde::Serialize for EncryptedField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> serde::Deserialize<'de> for EncryptedField {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EncryptedField::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// Encrypt `plaintext` with a 32-byte `key` under a fresh random nonce.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<EncryptedField> {
    let (nonce, ciphertext) = encrypt_detached(key, plaintext)?;

    // Prepend the nonce so the caller only needs to store one blob.
    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(EncryptedField(output))
}

/// Decrypt a field that was produced by `encrypt`.
///
/// Fails with `CipherFailure` if the field was tampered with or was
/// encrypted under a different key.
pub fn decrypt(key: &[u8], field: &EncryptedField) -> Result<Vec<u8>> {
    let bytes = field.as_bytes();

    // Make sure we have at least a nonce worth of bytes.
    if bytes.len() < NONCE_LEN {
        return Err(VaultError::CipherFailure);
    }

    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| VaultError::CipherFailure)?;

    decrypt_detached(key, &nonce, ciphertext)
}

/// Encrypt with the nonce returned separately from the ciphertext.
///
/// The backup wire format stores the IV as its own field, so the codec
/// needs the pieces rather than the combined blob.
pub fn encrypt_detached(key: &[u8], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    // Generate a random 12-byte nonce.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    Ok((nonce.into(), ciphertext))
}

/// Decrypt ciphertext+tag with an explicit nonce.
pub fn decrypt_detached(key: &[u8], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::CipherFailure)?;
    let nonce = Nonce::from_slice(nonce);

    // Decrypt and verify the auth tag.  The error is deliberately
    // opaque: tag mismatch and corrupt input look identical.
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::CipherFailure)
}
