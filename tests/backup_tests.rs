//! Integration tests for backup export, import, and validation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use vaultguard::backup::{self, parse_manifest, to_json};
use vaultguard::errors::VaultError;
use vaultguard::vault::{EntryStore, MemoryEntryStore, VaultEntry};

const BACKUP_PASSWORD: &str = "BackupPass1";
const APP_VERSION: &str = "0.4.2";

fn store_with(entries: &[(&str, &str)]) -> MemoryEntryStore {
    let mut store = MemoryEntryStore::new();
    for (title, secret) in entries {
        store.insert(VaultEntry::new(title, secret));
    }
    store
}

fn export_json(store: &MemoryEntryStore, password: &str) -> String {
    let manifest = backup::export(store, password, APP_VERSION).expect("export");
    to_json(&manifest).expect("serialize")
}

// ---------------------------------------------------------------------------
// Export / import round trip
// ---------------------------------------------------------------------------

#[test]
fn export_import_roundtrip_with_replace() {
    let source = store_with(&[("Gmail", "hunter2")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let mut target = MemoryEntryStore::new();
    let report = backup::import(&mut target, &json, BACKUP_PASSWORD, true).expect("import");

    assert_eq!(report.imported, 1);
    assert!(report.failures.is_empty());

    let entries = target.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Gmail");
    assert_eq!(entries[0].secret, "hunter2");
}

#[test]
fn roundtrip_preserves_metadata_and_custom_fields() {
    let mut entry = VaultEntry::new("Work VPN", "vpn-secret");
    entry.username = "alice".into();
    entry.email = "alice@example.com".into();
    entry.url = "https://vpn.example.com".into();
    entry.notes = "rotate quarterly".into();
    entry.category_name = "Work".into();
    entry.custom_fields.push(vaultguard::vault::CustomField {
        field_name: "realm".into(),
        field_value: "corp".into(),
        sensitive: false,
    });

    let mut source = MemoryEntryStore::new();
    source.insert(entry.clone());

    let json = export_json(&source, BACKUP_PASSWORD);
    let mut target = MemoryEntryStore::new();
    backup::import(&mut target, &json, BACKUP_PASSWORD, true).expect("import");

    assert_eq!(target.list()[0], entry);
}

#[test]
fn export_uses_one_salt_and_fresh_ivs() {
    let source = store_with(&[("One", "s1"), ("Two", "s2"), ("Three", "s3")]);
    let manifest = backup::export(&source, BACKUP_PASSWORD, APP_VERSION).expect("export");

    assert_eq!(manifest.version, "1.1");
    assert_eq!(manifest.crypto.kdf, "PBKDF2-SHA256");
    assert_eq!(manifest.crypto.iterations, 100_000);
    assert_eq!(manifest.crypto.salt.len(), 16);
    assert_eq!(manifest.entry_count, 3);

    // Every entry carries its own 12-byte IV; none repeat.
    let mut ivs = std::collections::HashSet::new();
    for entry in &manifest.entries {
        let iv = BASE64.decode(&entry.iv).expect("iv decodes");
        assert_eq!(iv.len(), 12);
        assert!(ivs.insert(iv), "duplicate IV in manifest");
    }
}

// ---------------------------------------------------------------------------
// Export rejections
// ---------------------------------------------------------------------------

#[test]
fn exporting_an_empty_vault_is_rejected() {
    let store = MemoryEntryStore::new();
    let result = backup::export(&store, BACKUP_PASSWORD, APP_VERSION);
    assert!(matches!(result, Err(VaultError::EmptyVault)));
}

#[test]
fn short_backup_password_is_rejected() {
    let store = store_with(&[("Gmail", "hunter2")]);
    let result = backup::export(&store, "short7!", APP_VERSION);
    assert!(matches!(result, Err(VaultError::BackupPasswordTooShort(8))));
}

// ---------------------------------------------------------------------------
// Version gating
// ---------------------------------------------------------------------------

#[test]
fn legacy_version_1_0_is_rejected_and_vault_unchanged() {
    let source = store_with(&[("Gmail", "hunter2")]);
    let mut manifest = backup::export(&source, BACKUP_PASSWORD, APP_VERSION).unwrap();
    manifest.version = "1.0".to_string();
    let json = to_json(&manifest).unwrap();

    let mut target = store_with(&[("Existing", "keep-me")]);
    let result = backup::import(&mut target, &json, BACKUP_PASSWORD, true);

    match result {
        Err(VaultError::UnsupportedVersion(v)) => assert_eq!(v, "1.0"),
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
    assert_eq!(target.len(), 1, "vault must be untouched");
    assert_eq!(target.list()[0].secret, "keep-me");
}

#[test]
fn unknown_future_version_is_rejected() {
    let source = store_with(&[("Gmail", "hunter2")]);
    let mut manifest = backup::export(&source, BACKUP_PASSWORD, APP_VERSION).unwrap();
    manifest.version = "9.9".to_string();
    let json = to_json(&manifest).unwrap();

    let mut target = MemoryEntryStore::new();
    assert!(matches!(
        backup::import(&mut target, &json, BACKUP_PASSWORD, true),
        Err(VaultError::UnsupportedVersion(_))
    ));
}

#[test]
fn garbage_document_is_malformed() {
    let mut target = MemoryEntryStore::new();
    let result = backup::import(&mut target, "{not json", BACKUP_PASSWORD, false);
    assert!(matches!(result, Err(VaultError::MalformedDocument(_))));
}

#[test]
fn entry_count_mismatch_is_malformed() {
    let source = store_with(&[("Gmail", "hunter2")]);
    let mut manifest = backup::export(&source, BACKUP_PASSWORD, APP_VERSION).unwrap();
    manifest.entry_count = 5;
    let json = to_json(&manifest).unwrap();

    assert!(matches!(
        parse_manifest(&json),
        Err(VaultError::MalformedDocument(_))
    ));
}

// ---------------------------------------------------------------------------
// Partial failure tolerance
// ---------------------------------------------------------------------------

#[test]
fn one_bad_entry_does_not_abort_the_batch() {
    let source = store_with(&[("Good", "ok-secret"), ("Bad", "doomed"), ("Fine", "also-ok")]);
    let mut manifest = backup::export(&source, BACKUP_PASSWORD, APP_VERSION).unwrap();

    // Corrupt one entry's ciphertext (valid base64, wrong bytes).
    let bad = manifest
        .entries
        .iter_mut()
        .find(|e| e.title == "Bad")
        .unwrap();
    bad.encrypted_password = BASE64.encode([0u8; 32]);
    let json = to_json(&manifest).unwrap();

    let mut target = MemoryEntryStore::new();
    let report = backup::import(&mut target, &json, BACKUP_PASSWORD, true).expect("import");

    assert_eq!(report.imported, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].title, "Bad");
    assert!(!report.looks_like_wrong_password());
    assert_eq!(target.len(), 2);
}

#[test]
fn wrong_password_fails_every_entry_and_spares_the_vault() {
    let source = store_with(&[("One", "s1"), ("Two", "s2")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let mut target = store_with(&[("Existing", "keep-me")]);
    let report = backup::import(&mut target, &json, "WrongPass99", true).expect("import runs");

    assert_eq!(report.imported, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(report.looks_like_wrong_password());

    // Replace mode must not have wiped the vault for a wrong password.
    assert_eq!(target.len(), 1);
    assert_eq!(target.list()[0].title, "Existing");
}

// ---------------------------------------------------------------------------
// Duplicate handling
// ---------------------------------------------------------------------------

#[test]
fn duplicates_are_skipped_case_insensitively() {
    let source = store_with(&[("GMAIL", "new-secret"), ("Fresh", "fresh-secret")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let mut target = store_with(&[("gmail", "original-secret")]);
    let report = backup::import(&mut target, &json, BACKUP_PASSWORD, false).expect("import");

    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped_duplicates, vec!["GMAIL".to_string()]);

    // The existing entry was skipped, not overwritten.
    let existing = target
        .list()
        .into_iter()
        .find(|e| e.title.eq_ignore_ascii_case("gmail"))
        .unwrap();
    assert_eq!(existing.secret, "original-secret");
    assert_eq!(target.len(), 2);
}

#[test]
fn duplicates_within_one_manifest_are_skipped() {
    // Two entries whose titles differ only in case.
    let source = store_with(&[("Gmail", "first-secret"), ("gmail", "second-secret")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let mut target = MemoryEntryStore::new();
    let report = backup::import(&mut target, &json, BACKUP_PASSWORD, false).expect("import");

    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped_duplicates.len(), 1);
    assert_eq!(target.len(), 1);
}

#[test]
fn replace_mode_overwrites_duplicates() {
    let source = store_with(&[("Gmail", "new-secret")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let mut target = store_with(&[("gmail", "original-secret"), ("Other", "x")]);
    let report = backup::import(&mut target, &json, BACKUP_PASSWORD, true).expect("import");

    assert_eq!(report.imported, 1);
    assert!(report.skipped_duplicates.is_empty());
    assert_eq!(target.len(), 1);
    assert_eq!(target.list()[0].secret, "new-secret");
}

// ---------------------------------------------------------------------------
// Validation dry run
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_metadata_without_importing() {
    let source = store_with(&[("Gmail", "hunter2"), ("Bank", "pin")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let summary = backup::validate(&json, BACKUP_PASSWORD).expect("validate");
    assert_eq!(summary.version, "1.1");
    assert_eq!(summary.entry_count, 2);
    assert_eq!(summary.app_version, APP_VERSION);
}

#[test]
fn validate_rejects_a_wrong_password() {
    let source = store_with(&[("Gmail", "hunter2")]);
    let json = export_json(&source, BACKUP_PASSWORD);

    let result = backup::validate(&json, "WrongPass99");
    assert!(matches!(result, Err(VaultError::InvalidBackupPassword)));
}
