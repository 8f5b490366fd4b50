use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};

pub const TOKEN_LENGTH: usize = 48;
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Opaque credential letting one candidate fill in their own forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Lifetimes beyond [`MAX_TOKEN_TTL_DAYS`] are clamped.
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let value = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        let ttl = ttl.min(Duration::days(MAX_TOKEN_TTL_DAYS));
        Self {
            value,
            issued_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.value.as_bytes(), presented.as_bytes())
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenRejection {
    Unknown,
    Expired,
}

impl TokenRejection {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Expired => "expired",
        }
    }
}

/// Rejected access token. Expired and never-issued tokens render identically
/// so callers cannot probe which tokens once existed.
#[derive(Clone)]
pub struct TokenError {
    reason: TokenRejection,
}

impl TokenError {
    pub(crate) fn unknown() -> Self {
        Self {
            reason: TokenRejection::Unknown,
        }
    }

    pub(crate) fn expired() -> Self {
        Self {
            reason: TokenRejection::Expired,
        }
    }

    pub(crate) fn reason(&self) -> TokenRejection {
        self.reason
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("access token is invalid or has expired")
    }
}

impl fmt::Debug for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenError")
    }
}

impl std::error::Error for TokenError {}

/// Source of the current instant, injected so expiry can be exercised in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard = *guard + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn issued_tokens_are_alphanumeric_and_unique() {
        let first = AccessToken::issue(start(), Duration::days(30));
        let second = AccessToken::issue(start(), Duration::days(30));

        assert_eq!(first.value.len(), TOKEN_LENGTH);
        assert!(first.value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.value, second.value);
    }

    #[test]
    fn token_expires_at_end_of_window() {
        let token = AccessToken::issue(start(), Duration::days(30));

        assert!(token.is_valid_at(start() + Duration::days(29)));
        assert!(!token.is_valid_at(start() + Duration::days(30)));
    }

    #[test]
    fn oversized_lifetime_is_clamped() {
        let token = AccessToken::issue(start(), Duration::days(100_000_000));

        assert_eq!(token.expires_at, start() + Duration::days(MAX_TOKEN_TTL_DAYS));
    }

    #[test]
    fn matches_requires_exact_value() {
        let token = AccessToken::issue(start(), Duration::days(1));
        let mut tampered = token.value.clone();
        tampered.pop();

        assert!(token.matches(&token.value));
        assert!(!token.matches(&tampered));
    }

    #[test]
    fn unknown_and_expired_errors_render_identically() {
        let unknown = TokenError::unknown();
        let expired = TokenError::expired();

        assert_eq!(unknown.to_string(), expired.to_string());
        assert_eq!(format!("{unknown:?}"), format!("{expired:?}"));
        assert_ne!(unknown.reason(), expired.reason());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::hours(5));
        assert_eq!(clock.now(), start() + Duration::hours(5));
    }
}
