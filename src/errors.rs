use thiserror::Error;

/// All errors that can occur in VaultGuard.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Authentication errors ---
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is blocked — try again in {remaining_seconds} seconds")]
    AccountBlocked { remaining_seconds: i64 },

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    // --- Crypto errors ---
    #[error("No session key derived — authenticate first")]
    KeyNotDerived,

    #[error("Decryption failed — authentication failed")]
    CipherFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Recovery errors ---
    #[error("Invalid recovery key")]
    InvalidRecoveryKey,

    #[error("No recovery key is set up for this account")]
    NoRecoverySetup,

    // --- Backup errors ---
    #[error("Invalid backup password")]
    InvalidBackupPassword,

    #[error("Backup password must be at least {0} characters")]
    BackupPasswordTooShort(usize),

    #[error("Unsupported backup version '{0}'")]
    UnsupportedVersion(String),

    #[error("Malformed backup document: {0}")]
    MalformedDocument(String),

    #[error("Cannot export an empty vault")]
    EmptyVault,

    // --- Breach check errors ---
    #[error("Breach check network failure: {0}")]
    NetworkFailure(String),

    #[error("Breach check returned unexpected status {0}")]
    UnexpectedStatus(u16),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience type alias for VaultGuard results.
pub type Result<T> = std::result::Result<T, VaultError>;
