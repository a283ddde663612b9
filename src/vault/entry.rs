//! Vault entry types and the persistence boundary for entries.
//!
//! Entry persistence (tables, files) is external to this core.  The
//! batch operations here — backup export/import, bulk breach checking —
//! operate on already-decrypted entry data reached through the
//! `EntryStore` trait.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined extra field on an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub field_name: String,
    pub field_value: String,
    pub sensitive: bool,
}

/// A decrypted credential entry as seen at the core's boundary.
///
/// The `secret` field is plaintext here; encryption at rest is handled
/// by the store behind this boundary using the session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub id: Uuid,
    pub title: String,
    pub username: String,
    pub email: String,
    pub url: String,
    pub notes: String,
    pub category_name: String,
    pub custom_fields: Vec<CustomField>,
    pub secret: String,
}

impl VaultEntry {
    /// Minimal constructor for the common title + secret case.
    pub fn new(title: &str, secret: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            username: String::new(),
            email: String::new(),
            url: String::new(),
            notes: String::new(),
            category_name: String::new(),
            custom_fields: Vec::new(),
            secret: secret.to_string(),
        }
    }
}

/// Boundary trait for wherever entries are persisted.
pub trait EntryStore {
    /// All entries, decrypted.
    fn list(&self) -> Vec<VaultEntry>;

    /// Add an entry.
    fn insert(&mut self, entry: VaultEntry);

    /// Delete every entry.  Used by backup replace-mode import.
    fn clear(&mut self);

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory entry store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    entries: Vec<VaultEntry>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStore for MemoryEntryStore {
    fn list(&self) -> Vec<VaultEntry> {
        self.entries.clone()
    }

    fn insert(&mut self, entry: VaultEntry) {
        self.entries.push(entry);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
