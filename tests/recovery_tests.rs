//! Integration tests for recovery keys and account recovery.

use vaultguard::auth::{
    generate_recovery_key, hash_recovery_key, unwrap_master_secret, verify_recovery_key,
    wrap_master_secret, Authenticator, CredentialStore, MemoryCredentialStore, RecoverySetup,
};
use vaultguard::crypto;
use vaultguard::errors::VaultError;

// ---------------------------------------------------------------------------
// Recovery key generation
// ---------------------------------------------------------------------------

#[test]
fn recovery_keys_are_well_formed() {
    let key = generate_recovery_key();

    // Six dash-separated groups of four: XXXX-XXXX-XXXX-XXXX-XXXX-XXXX.
    assert_eq!(key.len(), 29);
    let groups: Vec<&str> = key.split('-').collect();
    assert_eq!(groups.len(), 6);
    for group in groups {
        assert_eq!(group.len(), 4);
        assert!(group
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert!(
            !group.contains(&['0', 'O', 'I'][..]),
            "ambiguous symbol in {group}"
        );
    }
}

#[test]
fn recovery_keys_do_not_repeat() {
    let a = generate_recovery_key();
    let b = generate_recovery_key();
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Hashing and verification
// ---------------------------------------------------------------------------

#[test]
fn hash_verify_roundtrip() {
    let key = generate_recovery_key();
    let hash = hash_recovery_key(&key);

    assert!(verify_recovery_key(&key, &hash));
    assert!(!verify_recovery_key(&generate_recovery_key(), &hash));
}

#[test]
fn verification_accepts_undashed_lowercase_input() {
    let key = generate_recovery_key();
    let hash = hash_recovery_key(&key);

    let relaxed: String = key.chars().filter(|c| *c != '-').collect();
    assert!(verify_recovery_key(&relaxed.to_lowercase(), &hash));
}

#[test]
fn garbage_stored_hash_never_verifies() {
    assert!(!verify_recovery_key("AAAA-BBBB-CCCC-DDDD-EEEE-FFFF", "!!not-base64!!"));
}

// ---------------------------------------------------------------------------
// Master-secret wrapping
// ---------------------------------------------------------------------------

#[test]
fn wrap_unwrap_roundtrip() {
    let recovery_key = generate_recovery_key();
    let wrapped = wrap_master_secret("master-password", &recovery_key).expect("wrap");

    let unwrapped = unwrap_master_secret(&wrapped, &recovery_key).expect("unwrap");
    assert_eq!(unwrapped, "master-password");
}

#[test]
fn wrong_recovery_key_cannot_unwrap() {
    let recovery_key = generate_recovery_key();
    let wrapped = wrap_master_secret("master-password", &recovery_key).expect("wrap");

    let result = unwrap_master_secret(&wrapped, &generate_recovery_key());
    assert!(matches!(result, Err(VaultError::InvalidRecoveryKey)));
}

#[test]
fn tampered_wrapped_secret_is_rejected() {
    let recovery_key = generate_recovery_key();
    let wrapped = wrap_master_secret("master-password", &recovery_key).expect("wrap");

    // Corrupt the middle of the base64 blob.
    let mut bytes = wrapped.into_bytes();
    let mid = bytes.len() / 2;
    bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let result = unwrap_master_secret(&tampered, &recovery_key);
    assert!(matches!(result, Err(VaultError::InvalidRecoveryKey)));
}

#[test]
fn setup_bundle_is_self_consistent() {
    let setup = RecoverySetup::generate("master-password").expect("setup");

    assert!(verify_recovery_key(&setup.recovery_key, &setup.recovery_key_hash));
    assert_eq!(
        unwrap_master_secret(&setup.wrapped_master_secret, &setup.recovery_key).unwrap(),
        "master-password"
    );
}

// ---------------------------------------------------------------------------
// Full account recovery protocol
// ---------------------------------------------------------------------------

#[test]
fn recover_account_with_valid_key() {
    let mut auth = Authenticator::new(MemoryCredentialStore::new());
    let recovery_key = auth.register("alice", "forgotten-password").unwrap();

    let outcome = auth
        .recover_account("alice", &recovery_key, "brand-new-password")
        .expect("recovery");

    // The wrapped original password came back out.
    assert_eq!(outcome.previous_master_password, "forgotten-password");

    // The new password authenticates and the session key is live.
    auth.login("alice", "brand-new-password").expect("login");
    assert!(auth.key_manager().is_derived());
}

#[test]
fn previous_session_key_reads_fields_encrypted_before_recovery() {
    let mut auth = Authenticator::new(MemoryCredentialStore::new());
    let recovery_key = auth.register("alice", "forgotten-password").unwrap();

    auth.login("alice", "forgotten-password").expect("login");
    let field = auth
        .key_manager()
        .encrypt(b"pre-recovery secret")
        .expect("encrypt");
    auth.logout();

    let outcome = auth
        .recover_account("alice", &recovery_key, "brand-new-password")
        .expect("recovery");

    // The rotated session key no longer reads the old field.
    assert!(matches!(
        auth.key_manager().decrypt(&field),
        Err(VaultError::CipherFailure)
    ));

    // The returned previous key does, so the caller can migrate the
    // field to the new session.
    let plaintext = crypto::decrypt(outcome.previous_session_key.as_bytes(), &field)
        .expect("old key decrypts");
    assert_eq!(plaintext, b"pre-recovery secret");

    let migrated = auth.key_manager().encrypt(&plaintext).expect("re-encrypt");
    assert_eq!(
        auth.key_manager().decrypt(&migrated).unwrap(),
        b"pre-recovery secret"
    );
}

#[test]
fn recovery_invalidates_every_old_secret() {
    let mut auth = Authenticator::new(MemoryCredentialStore::new());
    let old_recovery_key = auth.register("alice", "old-password").unwrap();

    let before = auth.store().find("alice").unwrap();
    auth.recover_account("alice", &old_recovery_key, "new-password")
        .expect("recovery");
    let after = auth.store().find("alice").unwrap();

    // Old password permanently invalid.
    assert!(matches!(
        auth.login("alice", "old-password"),
        Err(VaultError::InvalidCredentials)
    ));

    // Old recovery key no longer matches the stored hash, and a second
    // recovery with it is refused.
    assert!(!verify_recovery_key(
        &old_recovery_key,
        after.recovery_key_hash.as_deref().unwrap()
    ));
    assert!(matches!(
        auth.recover_account("alice", &old_recovery_key, "another-password"),
        Err(VaultError::InvalidRecoveryKey)
    ));

    // Full rotation of the stored record.
    assert_ne!(before.password_hash, after.password_hash);
    assert_ne!(before.password_salt, after.password_salt);
    assert_ne!(before.wrapped_master_secret, after.wrapped_master_secret);
    assert_eq!(after.key_version, before.key_version + 1);
}

#[test]
fn recovery_clears_an_active_block() {
    let mut auth = Authenticator::new(MemoryCredentialStore::new());
    let recovery_key = auth.register("alice", "password-one").unwrap();

    for _ in 0..5 {
        let _ = auth.login("alice", "wrong");
    }
    assert!(auth.guard().is_blocked("alice"));

    auth.recover_account("alice", &recovery_key, "password-two")
        .expect("recovery");

    assert!(!auth.guard().is_blocked("alice"));
    auth.login("alice", "password-two").expect("login after recovery");
}

#[test]
fn recover_with_wrong_key_changes_nothing() {
    let mut auth = Authenticator::new(MemoryCredentialStore::new());
    auth.register("alice", "password-one").unwrap();

    let before = auth.store().find("alice").unwrap();
    let result = auth.recover_account("alice", "AAAA-BBBB-CCCC-DDDD-EEEE-FFFF", "password-two");
    assert!(matches!(result, Err(VaultError::InvalidRecoveryKey)));

    let after = auth.store().find("alice").unwrap();
    assert_eq!(before.password_hash, after.password_hash);
    assert_eq!(after.key_version, before.key_version);
    auth.login("alice", "password-one").expect("old password still valid");
}

#[test]
fn recover_unknown_user() {
    let mut auth = Authenticator::new(MemoryCredentialStore::new());
    let result = auth.recover_account("nobody", "AAAA-BBBB-CCCC-DDDD-EEEE-FFFF", "pw");
    assert!(matches!(result, Err(VaultError::UserNotFound(_))));
}
