//! Failed-login counting and timed lockout, per username.
//!
//! A username moves through three logical states: clean (no failures),
//! warned (some failures, below the limit), and blocked (too many
//! failures, until a deadline).  Expiry is lazy: the next check against
//! the clock resets an expired block — no background timer.
//!
//! State is process-local and safe under concurrent access from the UI,
//! background checks, and the main session flow.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Default number of consecutive failures before a block.
pub const MAX_ATTEMPTS: u32 = 5;

/// Default block duration in minutes.
pub const BLOCK_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy)]
struct AttemptState {
    failures: u32,
    blocked_until: Option<DateTime<Utc>>,
}

/// Per-username failed-attempt tracking.  Gates calls into the
/// `KeyManager`: the application must refuse to even verify a password
/// for a blocked username.
pub struct LoginGuard {
    max_attempts: u32,
    block_duration: Duration,
    state: Mutex<HashMap<String, AttemptState>>,
}

impl Default for LoginGuard {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::minutes(BLOCK_MINUTES))
    }
}

impl LoginGuard {
    /// Create a guard with explicit limits (see `Settings`).
    pub fn new(max_attempts: u32, block_duration: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            block_duration,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failed login attempt for `username`.
    ///
    /// Reaching the attempt limit transitions the account to blocked
    /// with a deadline of now + block duration.
    pub fn login_failed(&self, username: &str) {
        self.login_failed_at(username, Utc::now());
    }

    /// Clock-injected variant of [`login_failed`](Self::login_failed).
    pub fn login_failed_at(&self, username: &str, now: DateTime<Utc>) {
        let mut state = self.lock();
        let entry = state.entry(username.to_string()).or_insert(AttemptState {
            failures: 0,
            blocked_until: None,
        });

        entry.failures += 1;
        if entry.failures >= self.max_attempts {
            entry.blocked_until = Some(now + self.block_duration);
        }
    }

    /// Clear all recorded failures for `username`.
    pub fn login_succeeded(&self, username: &str) {
        let mut state = self.lock();
        state.remove(username);
    }

    /// Whether `username` is currently blocked.
    ///
    /// An expired block is reset to clean as a side effect of this
    /// check (lazy expiry).
    pub fn is_blocked(&self, username: &str) -> bool {
        self.is_blocked_at(username, Utc::now())
    }

    /// Clock-injected variant of [`is_blocked`](Self::is_blocked).
    pub fn is_blocked_at(&self, username: &str, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        match state.get(username).and_then(|s| s.blocked_until) {
            Some(until) if now < until => true,
            Some(_) => {
                // Block has expired — back to clean.
                state.remove(username);
                false
            }
            None => false,
        }
    }

    /// How many attempts remain before `username` is blocked.
    pub fn remaining_attempts(&self, username: &str) -> u32 {
        self.remaining_attempts_at(username, Utc::now())
    }

    /// Clock-injected variant of [`remaining_attempts`](Self::remaining_attempts).
    pub fn remaining_attempts_at(&self, username: &str, now: DateTime<Utc>) -> u32 {
        if self.is_blocked_at(username, now) {
            return 0;
        }
        let state = self.lock();
        let failures = state.get(username).map_or(0, |s| s.failures);
        self.max_attempts.saturating_sub(failures)
    }

    /// Time remaining on an active block, or `None` when not blocked.
    pub fn block_time_remaining(&self, username: &str) -> Option<Duration> {
        self.block_time_remaining_at(username, Utc::now())
    }

    /// Clock-injected variant of [`block_time_remaining`](Self::block_time_remaining).
    pub fn block_time_remaining_at(&self, username: &str, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_blocked_at(username, now) {
            return None;
        }
        let state = self.lock();
        state
            .get(username)
            .and_then(|s| s.blocked_until)
            .map(|until| until - now)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AttemptState>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
