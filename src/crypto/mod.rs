//! Cryptographic primitives for VaultGuard.
//!
//! This module provides:
//! - AES-256-GCM field encryption and the `EncryptedField` type (`cipher`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - Session key lifecycle and the `KeyManager` (`session`)

pub mod cipher;
pub mod kdf;
pub mod session;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use cipher::{decrypt, encrypt, EncryptedField};
pub use kdf::{derive_key, derive_key_with_iterations, generate_salt, PBKDF2_ITERATIONS};
pub use session::{KeyManager, SessionKey};
