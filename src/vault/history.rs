//! Bounded history of previous secret values, per entry.
//!
//! Every secret update records the old value, encrypted under the
//! active session key.  At most `limit` (default 10) records are kept
//! per entry; append and prune happen under one lock, so a reader never
//! observes more than `limit` records.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crypto::{EncryptedField, KeyManager};
use crate::errors::Result;

/// Default maximum number of history records per entry.
pub const HISTORY_LIMIT: usize = 10;

/// One retained previous secret value.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub secret: EncryptedField,
    pub changed_at: DateTime<Utc>,
}

/// A decrypted history record, ready for presentation.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub id: Uuid,
    pub secret: String,
    pub changed_at: DateTime<Utc>,
}

/// Records and serves per-entry secret history.
pub struct HistoryManager {
    key_manager: Arc<KeyManager>,
    limit: usize,
    // Oldest record first within each entry's vec.
    records: Mutex<HashMap<Uuid, Vec<HistoryRecord>>>,
}

impl HistoryManager {
    /// Create a manager with the default per-entry limit.
    pub fn new(key_manager: Arc<KeyManager>) -> Self {
        Self::with_limit(key_manager, HISTORY_LIMIT)
    }

    /// Create a manager with an explicit per-entry limit (see `Settings`).
    pub fn with_limit(key_manager: Arc<KeyManager>, limit: usize) -> Self {
        Self {
            key_manager,
            limit: limit.max(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Record that `entry_id`'s secret changed away from `old_secret`.
    ///
    /// Encrypts the old value with the session key, appends it, and
    /// prunes the oldest excess records — one atomic unit of work.
    pub fn record_change(&self, entry_id: Uuid, old_secret: &str) -> Result<()> {
        let encrypted = self.key_manager.encrypt(old_secret.as_bytes())?;

        let record = HistoryRecord {
            id: Uuid::new_v4(),
            entry_id,
            secret: encrypted,
            changed_at: Utc::now(),
        };

        let mut records = self.lock();
        let entry_records = records.entry(entry_id).or_default();
        entry_records.push(record);

        // Prune oldest-first until we're back within the limit.
        while entry_records.len() > self.limit {
            entry_records.remove(0);
        }

        Ok(())
    }

    /// All history for an entry, newest-first, secrets decrypted.
    pub fn history(&self, entry_id: Uuid) -> Result<Vec<HistoryView>> {
        let snapshot: Vec<HistoryRecord> = {
            let records = self.lock();
            records.get(&entry_id).cloned().unwrap_or_default()
        };

        let mut views = Vec::with_capacity(snapshot.len());
        for record in snapshot.iter().rev() {
            let plaintext = self.key_manager.decrypt(&record.secret)?;
            let secret = String::from_utf8(plaintext)
                .map_err(|_| crate::errors::VaultError::CipherFailure)?;
            views.push(HistoryView {
                id: record.id,
                secret,
                changed_at: record.changed_at,
            });
        }

        Ok(views)
    }

    /// Number of retained records for an entry (no decryption).
    pub fn record_count(&self, entry_id: Uuid) -> usize {
        self.lock().get(&entry_id).map_or(0, Vec::len)
    }

    /// Drop all history for an entry.  Called when the entry is deleted.
    pub fn clear_entry(&self, entry_id: Uuid) {
        self.lock().remove(&entry_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Vec<HistoryRecord>>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}
