//! Credential record and the persistence boundary it crosses.
//!
//! The actual credential store (database, file, whatever) lives outside
//! this core.  We only define the fields the core reads and writes, and
//! a small trait the surrounding application implements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// Re-use the base64 serde helpers from the backup manifest (no duplication).
use crate::backup::manifest::{base64_decode, base64_encode};

/// A user's stored authentication material.
///
/// Created at registration, fully rotated at password change and
/// recovery, read at every authentication.  `password_salt` is unique
/// per credential and never reused raw for a second derivation purpose
/// (each derivation extends it with a context tag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,

    /// PBKDF2 output for password verification (base64 in JSON).
    pub password_hash: String,

    /// The per-credential random salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub password_salt: Vec<u8>,

    /// PBKDF2 hash of the recovery key, or `None` before recovery setup.
    pub recovery_key_hash: Option<String>,

    /// Master password encrypted under a key derived from the recovery
    /// key (base64 `nonce || ciphertext || tag`).
    pub wrapped_master_secret: Option<String>,

    /// Bumped on every password change / recovery rotation.
    pub key_version: u32,
}

/// Boundary trait for wherever credentials are persisted.
pub trait CredentialStore {
    /// Look up a credential by username.
    fn find(&self, username: &str) -> Option<Credential>;

    /// Insert or replace a credential.
    fn upsert(&mut self, credential: Credential);

    /// Remove a credential.  Returns `true` if one existed.
    fn remove(&mut self, username: &str) -> bool;
}

/// In-memory credential store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: HashMap<String, Credential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find(&self, username: &str) -> Option<Credential> {
        self.credentials.get(username).cloned()
    }

    fn upsert(&mut self, credential: Credential) {
        self.credentials
            .insert(credential.username.clone(), credential);
    }

    fn remove(&mut self, username: &str) -> bool {
        self.credentials.remove(username).is_some()
    }
}
