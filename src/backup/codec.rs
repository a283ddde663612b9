//! Backup export, import, and validation.
//!
//! Export derives ONE key from the backup password and a fresh global
//! salt — a deliberate trade-off versus per-entry derivation, which
//! would cost one full PBKDF2 run per entry for no extra security as
//! long as every entry gets its own IV.
//!
//! Import is partial-failure tolerant: one undecryptable entry is
//! collected into the report and the batch continues.  A document whose
//! entries *all* fail to decrypt means the backup password is wrong.

use std::collections::HashSet;

use zeroize::Zeroize;

use super::manifest::{
    self, BackupManifest, ManifestCrypto, ManifestEntry, CURRENT_VERSION, MANIFEST_KDF,
};
use crate::crypto::cipher::{self, NONCE_LEN};
use crate::crypto::kdf;
use crate::errors::{Result, VaultError};
use crate::vault::{EntryStore, VaultEntry};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Minimum accepted backup password length.
pub const MIN_BACKUP_PASSWORD_LEN: usize = 8;

/// One entry that could not be imported.  Non-fatal — collected into
/// the [`ImportReport`] while the batch continues.
#[derive(Debug, Clone)]
pub struct EntryImportError {
    pub title: String,
    pub reason: String,
}

/// Outcome of an import batch.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Entries successfully decrypted and inserted.
    pub imported: usize,

    /// Titles skipped because an entry with the same title (case-
    /// insensitive) already exists.  Always empty in replace mode.
    pub skipped_duplicates: Vec<String>,

    /// Per-entry failures.
    pub failures: Vec<EntryImportError>,
}

impl ImportReport {
    /// True when every entry in the document failed to decrypt — the
    /// caller should treat this as "wrong backup password".
    pub fn looks_like_wrong_password(&self) -> bool {
        self.imported == 0 && self.skipped_duplicates.is_empty() && !self.failures.is_empty()
    }
}

/// Manifest metadata reported by [`validate`].
#[derive(Debug, Clone)]
pub struct BackupSummary {
    pub version: String,
    pub export_date: chrono::DateTime<chrono::Utc>,
    pub entry_count: usize,
    pub app_version: String,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Export the whole vault as an encrypted portable manifest.
///
/// Rejects an empty vault and backup passwords shorter than 8
/// characters.  Only each entry's secret is encrypted; the remaining
/// metadata travels in plaintext inside the manifest.
pub fn export(store: &dyn EntryStore, password: &str, app_version: &str) -> Result<BackupManifest> {
    if store.is_empty() {
        return Err(VaultError::EmptyVault);
    }
    if password.chars().count() < MIN_BACKUP_PASSWORD_LEN {
        return Err(VaultError::BackupPasswordTooShort(MIN_BACKUP_PASSWORD_LEN));
    }

    // One fresh global salt, one key derivation for the whole manifest.
    let salt = kdf::generate_salt();
    let mut key = kdf::derive_key(password.as_bytes(), &salt);

    let entries = store.list();
    let mut manifest_entries = Vec::with_capacity(entries.len());

    for entry in &entries {
        // Fresh IV per entry; never reused under the manifest key.
        let (iv, ciphertext) = match cipher::encrypt_detached(&key, entry.secret.as_bytes()) {
            Ok(pair) => pair,
            Err(e) => {
                key.zeroize();
                return Err(e);
            }
        };

        manifest_entries.push(ManifestEntry {
            id: entry.id,
            title: entry.title.clone(),
            username: entry.username.clone(),
            email: entry.email.clone(),
            url: entry.url.clone(),
            notes: entry.notes.clone(),
            category_name: entry.category_name.clone(),
            custom_fields: entry.custom_fields.clone(),
            encrypted_password: BASE64.encode(&ciphertext),
            iv: BASE64.encode(iv),
        });
    }

    key.zeroize();

    Ok(BackupManifest {
        version: CURRENT_VERSION.to_string(),
        export_date: chrono::Utc::now(),
        entry_count: manifest_entries.len(),
        app_version: app_version.to_string(),
        crypto: ManifestCrypto {
            kdf: MANIFEST_KDF.to_string(),
            iterations: kdf::PBKDF2_ITERATIONS,
            salt: salt.to_vec(),
        },
        entries: manifest_entries,
    })
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import a backup document into `store`.
///
/// `replace = true` deletes the entire existing vault before importing
/// (confirmation is a UI-layer concern) — but only after the document
/// has been decrypted in memory, so a wrong password or bad document
/// can never leave the vault empty.  With `replace = false`, entries
/// whose title matches an existing one case-insensitively are skipped,
/// not overwritten.
pub fn import(
    store: &mut dyn EntryStore,
    json: &str,
    password: &str,
    replace: bool,
) -> Result<ImportReport> {
    let manifest = manifest::parse_manifest(json)?;

    // One key derivation, replaying the manifest's recorded parameters.
    let mut key = kdf::derive_key_with_iterations(
        password.as_bytes(),
        &manifest.crypto.salt,
        manifest.crypto.iterations,
    );

    // Decrypt everything into memory before touching the store.
    let mut decrypted = Vec::with_capacity(manifest.entries.len());
    let mut failures = Vec::new();

    for entry in &manifest.entries {
        match decrypt_entry(&key, entry) {
            Ok(plain) => decrypted.push(plain),
            Err(reason) => failures.push(EntryImportError {
                title: entry.title.clone(),
                reason,
            }),
        }
    }

    key.zeroize();

    // Nothing decrypted at all: wrong backup password.  In replace mode
    // this also protects the existing vault from being wiped for nothing.
    if decrypted.is_empty() {
        return Ok(ImportReport {
            imported: 0,
            skipped_duplicates: Vec::new(),
            failures,
        });
    }

    let mut skipped_duplicates = Vec::new();

    if replace {
        store.clear();
    }

    // Seen titles cover both what the store already holds and what this
    // batch has inserted so far, so a manifest carrying "Gmail" and
    // "gmail" does not import both.
    let mut seen_titles: HashSet<String> = store
        .list()
        .iter()
        .map(|e| e.title.to_lowercase())
        .collect();

    let mut imported = 0;
    for entry in decrypted {
        let title_key = entry.title.to_lowercase();
        if !replace && seen_titles.contains(&title_key) {
            skipped_duplicates.push(entry.title);
            continue;
        }
        seen_titles.insert(title_key);
        store.insert(entry);
        imported += 1;
    }

    Ok(ImportReport {
        imported,
        skipped_duplicates,
        failures,
    })
}

/// Decrypt one manifest entry.  Returns a human-readable reason on
/// failure; deliberately no more detail than "authentication failed".
fn decrypt_entry(key: &[u8], entry: &ManifestEntry) -> std::result::Result<VaultEntry, String> {
    let iv_bytes = BASE64
        .decode(&entry.iv)
        .map_err(|_| "invalid iv encoding".to_string())?;
    let iv: [u8; NONCE_LEN] = iv_bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("iv must be {NONCE_LEN} bytes"))?;

    let ciphertext = BASE64
        .decode(&entry.encrypted_password)
        .map_err(|_| "invalid ciphertext encoding".to_string())?;

    let plaintext = cipher::decrypt_detached(key, &iv, &ciphertext)
        .map_err(|_| "authentication failed".to_string())?;

    let secret = String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        "secret is not valid UTF-8".to_string()
    })?;

    Ok(VaultEntry {
        id: entry.id,
        title: entry.title.clone(),
        username: entry.username.clone(),
        email: entry.email.clone(),
        url: entry.url.clone(),
        notes: entry.notes.clone(),
        category_name: entry.category_name.clone(),
        custom_fields: entry.custom_fields.clone(),
        secret,
    })
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Dry-run a backup document: parse it, derive the key, and decrypt
/// only the first entry to confirm the password.  Mutates nothing.
pub fn validate(json: &str, password: &str) -> Result<BackupSummary> {
    let manifest = manifest::parse_manifest(json)?;

    let first = manifest
        .entries
        .first()
        .ok_or_else(|| VaultError::MalformedDocument("document contains no entries".into()))?;

    let mut key = kdf::derive_key_with_iterations(
        password.as_bytes(),
        &manifest.crypto.salt,
        manifest.crypto.iterations,
    );
    let check = decrypt_entry(&key, first);
    key.zeroize();

    if check.is_err() {
        return Err(VaultError::InvalidBackupPassword);
    }

    Ok(BackupSummary {
        version: manifest.version,
        export_date: manifest.export_date,
        entry_count: manifest.entry_count,
        app_version: manifest.app_version,
    })
}
