//! Recovery keys: password-less account recovery material.
//!
//! A recovery key is a high-entropy code handed to the user exactly
//! once.  It is stored only as a PBKDF2 hash, and it wraps (encrypts)
//! the master password so that a user who still holds the code can
//! recover access without knowing the current password.
//!
//! Both the hash and the wrapping key use PBKDF2 with *fixed*,
//! domain-separated salts.  That is deliberate: the recovery key itself
//! carries ~120 bits of entropy, so a salt buys nothing against brute
//! force here — it only has to keep the two derivations (and the
//! password-salt derivations) from ever producing related keys.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::Rng;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::cipher::{self, EncryptedField};
use crate::crypto::kdf;
use crate::errors::{Result, VaultError};

/// Symbols allowed in a recovery key.  33 characters: digits and
/// uppercase letters minus the visually ambiguous `0`, `O`, `I`.
const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Number of dash-separated groups.
const GROUPS: usize = 6;

/// Symbols per group.  6 * 4 = 24 symbols ≈ 120 bits of entropy.
const GROUP_LEN: usize = 4;

/// Fixed salt for hashing recovery keys.  Distinct from every other
/// derivation purpose in the system.
const RECOVERY_HASH_SALT: &[u8] = b"vaultguard/recovery-hash/v1";

/// Fixed salt for deriving the master-secret wrapping key.
const RECOVERY_WRAP_SALT: &[u8] = b"vaultguard/recovery-wrap/v1";

/// Generate a fresh recovery key, formatted `XXXX-XXXX-XXXX-XXXX-XXXX-XXXX`.
pub fn generate_recovery_key() -> String {
    let mut rng = rand::rngs::OsRng;
    let mut groups = Vec::with_capacity(GROUPS);

    for _ in 0..GROUPS {
        let group: String = (0..GROUP_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        groups.push(group);
    }

    groups.join("-")
}

/// Canonical form used for hashing and key derivation: dashes stripped,
/// uppercased.  Lets users re-enter the code with or without dashes.
fn canonicalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Hash a recovery key for storage (base64 PBKDF2 output).
pub fn hash_recovery_key(key: &str) -> String {
    let canonical = canonicalize(key);
    let hash = kdf::derive_key(canonical.as_bytes(), RECOVERY_HASH_SALT);
    BASE64.encode(hash)
}

/// Verify a recovery key against a stored hash, in constant time.
pub fn verify_recovery_key(key: &str, stored_hash: &str) -> bool {
    let Ok(expected) = BASE64.decode(stored_hash) else {
        return false;
    };

    let canonical = canonicalize(key);
    let actual = kdf::derive_key(canonical.as_bytes(), RECOVERY_HASH_SALT);

    actual.ct_eq(&expected[..]).into()
}

/// Encrypt the master password under a key derived from the recovery
/// key.  Returns base64 `nonce || ciphertext || tag`.
pub fn wrap_master_secret(master_password: &str, recovery_key: &str) -> Result<String> {
    let canonical = canonicalize(recovery_key);
    let mut wrap_key = kdf::derive_key(canonical.as_bytes(), RECOVERY_WRAP_SALT);

    let field = cipher::encrypt(&wrap_key, master_password.as_bytes());
    wrap_key.zeroize();

    Ok(field?.to_base64())
}

/// Reverse of [`wrap_master_secret`].  A wrong recovery key fails the
/// GCM tag check and surfaces as `InvalidRecoveryKey`.
pub fn unwrap_master_secret(wrapped: &str, recovery_key: &str) -> Result<String> {
    let field = EncryptedField::from_base64(wrapped).map_err(|_| VaultError::InvalidRecoveryKey)?;

    let canonical = canonicalize(recovery_key);
    let mut wrap_key = kdf::derive_key(canonical.as_bytes(), RECOVERY_WRAP_SALT);

    let plaintext = cipher::decrypt(&wrap_key, &field);
    wrap_key.zeroize();

    let plaintext = plaintext.map_err(|_| VaultError::InvalidRecoveryKey)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        VaultError::InvalidRecoveryKey
    })
}

/// A freshly generated recovery key together with everything that gets
/// persisted for it.
pub struct RecoverySetup {
    /// The plaintext code.  Shown to the user once, never stored.
    pub recovery_key: String,
    /// PBKDF2 hash of the code (base64).
    pub recovery_key_hash: String,
    /// Master password wrapped under the code (base64).
    pub wrapped_master_secret: String,
}

impl RecoverySetup {
    /// Generate a new recovery key and wrap `master_password` under it.
    pub fn generate(master_password: &str) -> Result<Self> {
        let recovery_key = generate_recovery_key();
        let recovery_key_hash = hash_recovery_key(&recovery_key);
        let wrapped_master_secret = wrap_master_secret(master_password, &recovery_key)?;

        Ok(Self {
            recovery_key,
            recovery_key_hash,
            wrapped_master_secret,
        })
    }
}
