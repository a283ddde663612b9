//! Authentication: credentials, rate limiting, recovery, and the
//! session wiring between them.
//!
//! This module provides:
//! - `Credential` and the `CredentialStore` boundary trait (`credential`)
//! - Per-username failed-attempt tracking and lockout (`login_guard`)
//! - Recovery key generation and master-secret wrapping (`recovery`)
//! - `Authenticator`, which ties guard + store + `KeyManager` together

pub mod credential;
pub mod login_guard;
pub mod recovery;

pub use credential::{Credential, CredentialStore, MemoryCredentialStore};
pub use login_guard::LoginGuard;
pub use recovery::{
    generate_recovery_key, hash_recovery_key, unwrap_master_secret, verify_recovery_key,
    wrap_master_secret, RecoverySetup,
};

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Duration;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::Settings;
use crate::crypto::{kdf, KeyManager, SessionKey};
use crate::errors::{Result, VaultError};

/// Context tag appended to the credential salt for password hashing.
const AUTH_SALT_CONTEXT: &[u8] = b"/auth";

/// Context tag appended to the credential salt for session-key derivation.
///
/// The credential stores one random salt, but hash verification and
/// session-key derivation are different purposes — the raw salt bytes
/// are never fed to PBKDF2 twice for two purposes.
const SESSION_SALT_CONTEXT: &[u8] = b"/session";

fn context_salt(salt: &[u8], context: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(salt.len() + context.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(context);
    out
}

/// Hash a password for storage (base64 PBKDF2 output).
pub fn hash_password(password: &str, salt: &[u8]) -> String {
    let hash = kdf::derive_key(password.as_bytes(), &context_salt(salt, AUTH_SALT_CONTEXT));
    BASE64.encode(hash)
}

/// Verify a password against a stored hash, in constant time.
pub fn verify_password(password: &str, salt: &[u8], stored_hash: &str) -> bool {
    let Ok(expected) = BASE64.decode(stored_hash) else {
        return false;
    };

    let actual = kdf::derive_key(password.as_bytes(), &context_salt(salt, AUTH_SALT_CONTEXT));
    actual.ct_eq(&expected[..]).into()
}

/// Result of a successful account recovery.
///
/// Recovery rotates the credential salt, so the old session key cannot
/// be re-derived afterwards from anything still in the store.
/// `previous_session_key` is that key, captured while the old salt was
/// still at hand: the surrounding application decrypts stored fields
/// with it (via [`crate::crypto::decrypt`]) and re-encrypts them under
/// the new session, which the key manager already holds.  All secret
/// buffers are zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RecoveredAccount {
    /// The replacement recovery key — show it to the user once.
    pub new_recovery_key: String,
    /// The master password that was wrapped under the old recovery key.
    pub previous_master_password: String,
    /// The session key fields were encrypted under before the rotation.
    pub previous_session_key: SessionKey,
}

/// Authentication front door: gates every login through the
/// [`LoginGuard`], verifies against the [`CredentialStore`], and seeds
/// the shared [`KeyManager`] on success.
pub struct Authenticator<S: CredentialStore> {
    store: S,
    guard: LoginGuard,
    key_manager: Arc<KeyManager>,
}

impl<S: CredentialStore> Authenticator<S> {
    /// Create an authenticator with default limits (5 attempts, 15 min).
    pub fn new(store: S) -> Self {
        Self::with_settings(store, &Settings::default())
    }

    /// Create an authenticator configured from `Settings`.
    pub fn with_settings(store: S, settings: &Settings) -> Self {
        Self {
            store,
            guard: LoginGuard::new(
                settings.max_login_attempts,
                Duration::minutes(settings.lockout_minutes),
            ),
            key_manager: Arc::new(KeyManager::new()),
        }
    }

    /// The shared key manager.  Encryption consumers (entry CRUD,
    /// history) hold a clone of this handle.
    pub fn key_manager(&self) -> Arc<KeyManager> {
        Arc::clone(&self.key_manager)
    }

    /// The login guard, for UI-level reads (remaining attempts etc).
    pub fn guard(&self) -> &LoginGuard {
        &self.guard
    }

    /// Access the underlying credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Account lifecycle
    // ------------------------------------------------------------------

    /// Register a new user and return their recovery key.
    ///
    /// The recovery key is shown to the user exactly once by the UI
    /// layer; only its hash is persisted.
    pub fn register(&mut self, username: &str, password: &str) -> Result<String> {
        if self.store.find(username).is_some() {
            return Err(VaultError::UserAlreadyExists(username.to_string()));
        }

        let salt = kdf::generate_salt();
        let setup = RecoverySetup::generate(password)?;

        self.store.upsert(Credential {
            username: username.to_string(),
            password_hash: hash_password(password, &salt),
            password_salt: salt.to_vec(),
            recovery_key_hash: Some(setup.recovery_key_hash),
            wrapped_master_secret: Some(setup.wrapped_master_secret),
            key_version: 1,
        });

        Ok(setup.recovery_key)
    }

    /// Authenticate and derive the session key.
    ///
    /// Blocked accounts are rejected before any password material is
    /// touched.  A wrong password counts one failed attempt.
    pub fn login(&self, username: &str, password: &str) -> Result<()> {
        if self.guard.is_blocked(username) {
            let remaining = self
                .guard
                .block_time_remaining(username)
                .map_or(0, |d| d.num_seconds());
            return Err(VaultError::AccountBlocked {
                remaining_seconds: remaining,
            });
        }

        let credential = self
            .store
            .find(username)
            .ok_or_else(|| VaultError::UserNotFound(username.to_string()))?;

        if !verify_password(password, &credential.password_salt, &credential.password_hash) {
            self.guard.login_failed(username);
            return Err(VaultError::InvalidCredentials);
        }

        self.guard.login_succeeded(username);
        self.key_manager.derive_key(
            password.as_bytes(),
            &context_salt(&credential.password_salt, SESSION_SALT_CONTEXT),
        );

        Ok(())
    }

    /// End the session and zeroize the session key.
    pub fn logout(&self) {
        self.key_manager.clear();
    }

    /// Change the password inside an authenticated session.
    ///
    /// Rotates everything — salt, password hash, recovery key, wrapped
    /// secret — and returns the new recovery key.
    pub fn change_password(
        &mut self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<String> {
        let credential = self
            .store
            .find(username)
            .ok_or_else(|| VaultError::UserNotFound(username.to_string()))?;

        if !verify_password(old_password, &credential.password_salt, &credential.password_hash) {
            return Err(VaultError::InvalidCredentials);
        }

        self.rotate_credential(credential, new_password)
    }

    /// Recover access with a recovery key, without the current password.
    ///
    /// Protocol: verify the supplied key against the stored hash,
    /// unwrap the original master password, then rotate every secret
    /// field.  The old password and old recovery key become permanently
    /// invalid — recovering access must not leave any previously-issued
    /// secret still valid.
    pub fn recover_account(
        &mut self,
        username: &str,
        recovery_key: &str,
        new_password: &str,
    ) -> Result<RecoveredAccount> {
        let credential = self
            .store
            .find(username)
            .ok_or_else(|| VaultError::UserNotFound(username.to_string()))?;

        let (stored_hash, wrapped) = match (
            credential.recovery_key_hash.as_deref(),
            credential.wrapped_master_secret.as_deref(),
        ) {
            (Some(hash), Some(wrapped)) => (hash, wrapped),
            _ => return Err(VaultError::NoRecoverySetup),
        };

        if !verify_recovery_key(recovery_key, stored_hash) {
            return Err(VaultError::InvalidRecoveryKey);
        }

        let previous_master_password = unwrap_master_secret(wrapped, recovery_key)?;

        // Rotation replaces the salt, and recovery has no live session
        // to decrypt under first — so re-derive the outgoing session
        // key now, while the old salt is still in the credential.
        let mut previous_key_bytes = kdf::derive_key(
            previous_master_password.as_bytes(),
            &context_salt(&credential.password_salt, SESSION_SALT_CONTEXT),
        );
        let previous_session_key = SessionKey::new(previous_key_bytes);
        previous_key_bytes.zeroize();

        let new_recovery_key = self.rotate_credential(credential, new_password)?;
        self.guard.login_succeeded(username);

        Ok(RecoveredAccount {
            new_recovery_key,
            previous_master_password,
            previous_session_key,
        })
    }

    /// Full rotation: fresh salt, fresh password hash, fresh recovery
    /// key + hash + wrapped secret, bumped key version.  Re-seeds the
    /// key manager with the new session key.
    fn rotate_credential(&mut self, credential: Credential, new_password: &str) -> Result<String> {
        let new_salt = kdf::generate_salt();
        let setup = RecoverySetup::generate(new_password)?;
        let recovery_key = setup.recovery_key;

        self.store.upsert(Credential {
            username: credential.username.clone(),
            password_hash: hash_password(new_password, &new_salt),
            password_salt: new_salt.to_vec(),
            recovery_key_hash: Some(setup.recovery_key_hash),
            wrapped_master_secret: Some(setup.wrapped_master_secret),
            key_version: credential.key_version + 1,
        });

        self.key_manager.derive_key(
            new_password.as_bytes(),
            &context_salt(&new_salt, SESSION_SALT_CONTEXT),
        );

        Ok(recovery_key)
    }
}
