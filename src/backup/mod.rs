//! Backup module — versioned encrypted export/import.
//!
//! This module provides:
//! - The version-1.1 JSON wire format (`manifest`)
//! - Export, partial-failure-tolerant import, and dry-run validation (`codec`)

pub mod codec;
pub mod manifest;

// Re-export the most commonly used items.
pub use codec::{
    export, import, validate, BackupSummary, EntryImportError, ImportReport,
    MIN_BACKUP_PASSWORD_LEN,
};
pub use manifest::{parse_manifest, to_json, BackupManifest, ManifestCrypto, ManifestEntry};
