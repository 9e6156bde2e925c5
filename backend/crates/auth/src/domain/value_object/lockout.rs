//! Brute-Force Lockout Policy
//!
//! The policy tuple is loaded from the `settings` table as a JSON blob and
//! falls back to hard-coded defaults whenever the row is absent or
//! unparseable. The lockout itself is a sliding window over the
//! login-event ledger, re-evaluated on every attempt; `lock_minutes` only
//! feeds the human-readable retry time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Key under which the policy JSON lives in the `settings` table
pub const LOCKOUT_POLICY_KEY: &str = "lockout_policy";

fn default_window_minutes() -> i64 {
    15
}
fn default_max_attempts() -> i64 {
    5
}
fn default_lock_minutes() -> i64 {
    15
}

/// Brute-force lockout policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    /// Rolling span over which failed attempts are counted
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Failures within the window that trip the lock
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
    /// Display-only: feeds the "try again after" timestamp
    #[serde(default = "default_lock_minutes")]
    pub lock_minutes: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            max_attempts: default_max_attempts(),
            lock_minutes: default_lock_minutes(),
        }
    }
}

impl LockoutPolicy {
    /// Parse the settings blob, falling back to defaults on a missing or
    /// unparseable value.
    pub fn from_settings_json(raw: Option<&str>) -> Self {
        match raw {
            Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Unparseable lockout policy setting, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Start of the counting window as seen from `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::minutes(self.window_minutes)
    }

    /// The lock decision: tripped iff the failure count reached
    /// `max_attempts` and at least one failure exists (guards a zero
    /// `max_attempts` configuration from locking everyone out).
    pub fn locks(&self, recent_failures: i64) -> bool {
        recent_failures >= self.max_attempts && recent_failures > 0
    }

    /// Human-readable retry time shown with the lockout notice
    pub fn retry_after(&self, last_failure_at: DateTime<Utc>) -> DateTime<Utc> {
        last_failure_at + Duration::minutes(self.lock_minutes)
    }
}
