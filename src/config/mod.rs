//! Project-level configuration, loaded from `.vaultguard.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Security tunables for the vault core.
///
/// Every field has a sensible default so VaultGuard works out-of-the-box
/// without any config file at all.  Cryptographic parameters (PBKDF2
/// iteration count, key sizes) are protocol constants and deliberately
/// not configurable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Consecutive login failures before an account is blocked.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,

    /// How long a blocked account stays blocked, in minutes.
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,

    /// Maximum history records retained per entry.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Base URL of the breach-check range service.
    #[serde(default = "default_breach_endpoint")]
    pub breach_endpoint: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_max_login_attempts() -> u32 {
    5
}

fn default_lockout_minutes() -> i64 {
    15
}

fn default_history_limit() -> usize {
    10
}

fn default_breach_endpoint() -> String {
    "https://api.pwnedpasswords.com".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_login_attempts: default_max_login_attempts(),
            lockout_minutes: default_lockout_minutes(),
            history_limit: default_history_limit(),
            breach_endpoint: default_breach_endpoint(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".vaultguard.toml";

    /// Load settings from `<project_dir>/.vaultguard.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        toml::from_str(&content)
            .map_err(|e| VaultError::ConfigError(format!("{}: {e}", config_path.display())))
    }
}
