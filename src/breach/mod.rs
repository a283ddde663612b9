//! Breach checking against a public range-based index (k-anonymity).
//!
//! A candidate secret is hashed with SHA-1 locally — SHA-1 appears here
//! only because the external index protocol requires it; storage and
//! authentication never use it.  Only the first 5 hex characters of the
//! digest are sent to the service, which answers with every known
//! suffix in that range.  The full secret and full hash never leave the
//! process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::errors::{Result, VaultError};
use crate::vault::VaultEntry;

/// Hex characters of the digest disclosed to the range service.
const PREFIX_LEN: usize = 5;

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Severity classification from breach occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify an occurrence count.
    pub fn from_occurrences(occurrences: u64) -> Self {
        match occurrences {
            0 => Severity::Safe,
            1..=9 => Severity::Low,
            10..=99 => Severity::Medium,
            100..=999 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

/// Result of checking one candidate secret.
#[derive(Debug, Clone)]
pub struct BreachReport {
    pub breached: bool,
    pub occurrences: u64,
    pub severity: Severity,
}

/// One entry's outcome in a bulk scan.
#[derive(Debug)]
pub struct ScanItem {
    pub entry_id: Uuid,
    pub title: String,
    pub report: Result<BreachReport>,
}

/// Queries a remote range endpoint for breached secrets.
pub struct BreachChecker {
    endpoint: String,
    agent: ureq::Agent,
}

impl Default for BreachChecker {
    fn default() -> Self {
        Self::new("https://api.pwnedpasswords.com")
    }
}

impl BreachChecker {
    /// Create a checker against `endpoint` (no trailing slash).
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(REQUEST_TIMEOUT)
                .build(),
        }
    }

    /// Create a checker against the endpoint configured in `Settings`.
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self::new(&settings.breach_endpoint)
    }

    /// Check one candidate secret against the range index.
    ///
    /// Network failures and unexpected statuses are distinct errors —
    /// they must never be read as "not breached".
    pub fn check(&self, candidate: &str) -> Result<BreachReport> {
        let digest = sha1_hex_upper(candidate);
        let (prefix, suffix) = digest.split_at(PREFIX_LEN);

        let body = self.fetch_range(prefix)?;
        let occurrences = scan_range_body(&body, suffix);

        Ok(BreachReport {
            breached: occurrences > 0,
            occurrences,
            severity: Severity::from_occurrences(occurrences),
        })
    }

    /// Check a batch of entries with cooperative cancellation.
    ///
    /// Stops promptly once `cancel` is set; everything gathered so far
    /// is returned — already-computed results stay valid.  One entry's
    /// failure never aborts the rest of the scan.
    pub fn check_all(&self, entries: &[VaultEntry], cancel: &AtomicBool) -> Vec<ScanItem> {
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            results.push(ScanItem {
                entry_id: entry.id,
                title: entry.title.clone(),
                report: self.check(&entry.secret),
            });
        }

        results
    }

    /// `GET {endpoint}/range/{prefix}` returning the plaintext body.
    fn fetch_range(&self, prefix: &str) -> Result<String> {
        let url = format!("{}/range/{}", self.endpoint, prefix);

        let response = match self.agent.get(&url).set("Add-Padding", "true").call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(VaultError::UnexpectedStatus(code));
            }
            Err(e) => return Err(VaultError::NetworkFailure(e.to_string())),
        };

        response
            .into_string()
            .map_err(|e| VaultError::NetworkFailure(e.to_string()))
    }
}

/// Uppercase hex SHA-1 of a candidate secret.
fn sha1_hex_upper(candidate: &str) -> String {
    let digest = Sha1::digest(candidate.as_bytes());
    digest.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02X}");
        acc
    })
}

/// Scan newline-delimited `SUFFIX:COUNT` lines for our suffix.
///
/// Returns 0 when the suffix is absent (not breached).  Matching is
/// case-insensitive; malformed lines are skipped — including a matching
/// suffix whose count fails to parse, which must not be reported as
/// "not breached" when a later well-formed line could still match.
fn scan_range_body(body: &str, suffix: &str) -> u64 {
    for line in body.lines() {
        let Some((line_suffix, count)) = line.trim().split_once(':') else {
            continue;
        };
        if !line_suffix.eq_ignore_ascii_case(suffix) {
            continue;
        }
        if let Ok(count) = count.trim().parse() {
            return count;
        }
    }
    0
}
