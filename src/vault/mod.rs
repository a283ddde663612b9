//! Vault module — entry types and secret history.
//!
//! This module provides:
//! - `VaultEntry`, `CustomField`, and the `EntryStore` boundary trait (`entry`)
//! - Bounded per-entry history of previous secret values (`history`)

pub mod entry;
pub mod history;

// Re-export the most commonly used items.
pub use entry::{CustomField, EntryStore, MemoryEntryStore, VaultEntry};
pub use history::{HistoryManager, HistoryRecord, HistoryView, HISTORY_LIMIT};
