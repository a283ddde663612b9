//! Portable encrypted backup — wire format.
//!
//! A backup document is JSON, currently version `1.1`:
//!
//! ```json
//! {
//!   "version": "1.1",
//!   "exportDate": "<ISO-8601 datetime>",
//!   "entryCount": 2,
//!   "appVersion": "0.4.2",
//!   "crypto": { "kdf": "PBKDF2-SHA256", "iterations": 100000, "salt": "<base64 16B>" },
//!   "entries": [ { "id": "...", "title": "...", "encryptedPassword": "...", "iv": "...", ... } ]
//! }
//! ```
//!
//! One global salt and ONE key derivation per manifest; every entry
//! carries its own fresh 12-byte IV.  The legacy `1.0` format derived a
//! key per entry from per-entry salts — it is recognized by version tag
//! and rejected outright, never silently migrated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, VaultError};
use crate::vault::CustomField;

/// Version tag written by every export.
pub const CURRENT_VERSION: &str = "1.1";

/// Legacy per-entry-salt format — recognized, unsupported.
pub const LEGACY_VERSION: &str = "1.0";

/// KDF identifier recorded in the manifest.
pub const MANIFEST_KDF: &str = "PBKDF2-SHA256";

/// Key-derivation parameters for the whole manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCrypto {
    /// Always `"PBKDF2-SHA256"` for version 1.1.
    pub kdf: String,

    /// PBKDF2 iteration count used at export time.
    pub iterations: u32,

    /// The single global salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,
}

/// One exported entry.  Metadata travels in plaintext; only the secret
/// is encrypted, under the manifest key with this entry's own IV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: Uuid,
    pub title: String,
    pub username: String,
    pub email: String,
    pub url: String,
    pub notes: String,
    pub category_name: String,
    pub custom_fields: Vec<CustomField>,

    /// Ciphertext + auth tag (base64).
    pub encrypted_password: String,

    /// This entry's 12-byte IV (base64).
    pub iv: String,
}

/// A complete backup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub entry_count: usize,
    pub app_version: String,
    pub crypto: ManifestCrypto,
    pub entries: Vec<ManifestEntry>,
}

/// Just the version tag, read before committing to a full parse.
#[derive(Deserialize)]
struct VersionProbe {
    version: String,
}

/// Parse a backup document, rejecting unsupported versions up front.
///
/// The version tag is probed first so a `1.0` document fails with
/// `UnsupportedVersion` rather than a confusing shape mismatch.
pub fn parse_manifest(json: &str) -> Result<BackupManifest> {
    let probe: VersionProbe = serde_json::from_str(json)
        .map_err(|e| VaultError::MalformedDocument(e.to_string()))?;

    if probe.version != CURRENT_VERSION {
        return Err(VaultError::UnsupportedVersion(probe.version));
    }

    let manifest: BackupManifest = serde_json::from_str(json)
        .map_err(|e| VaultError::MalformedDocument(e.to_string()))?;

    if manifest.crypto.kdf != MANIFEST_KDF {
        return Err(VaultError::MalformedDocument(format!(
            "unknown kdf '{}'",
            manifest.crypto.kdf
        )));
    }
    if manifest.entry_count != manifest.entries.len() {
        return Err(VaultError::MalformedDocument(format!(
            "entryCount {} does not match {} entries",
            manifest.entry_count,
            manifest.entries.len()
        )));
    }

    Ok(manifest)
}

/// Serialize a manifest to pretty-printed JSON.
pub fn to_json(manifest: &BackupManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest)
        .map_err(|e| VaultError::SerializationError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
