//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! PBKDF2 with a high iteration count slows brute-force attacks against
//! the master password.  The iteration count is a protocol constant — it
//! is recorded in backup manifests so an import always replays the exact
//! parameters the export used.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count used for every password-based derivation.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive a 32-byte key from a password and salt.
///
/// The same password + salt always produce the same key.  This is the
/// only sanctioned way to turn a password into key material.
pub fn derive_key(password: &[u8], salt: &[u8]) -> [u8; KEY_LEN] {
    derive_key_with_iterations(password, salt, PBKDF2_ITERATIONS)
}

/// Derive a 32-byte key with an explicit iteration count.
///
/// Used by the backup codec, which must honour the iteration count
/// stored in the manifest rather than the current constant.
pub fn derive_key_with_iterations(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
