//! Admin authorization.
//!
//! Admin-only operations take an [`AdminGrant`] argument. The only way to get
//! one is [`AdminGate::authorize`], so every admin entry point performs the
//! check explicitly before it can do anything.

use crate::{error::Result, Error, Timestamp, MILLIS_PER_SECOND};
use parking_lot::Mutex;

/// Proof that the caller passed the admin password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGrant {
    issued_at: Timestamp,
}

impl AdminGrant {
    /// When the grant was issued.
    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }
}

#[derive(Debug, Default)]
struct Attempts {
    failures: u32,
    locked_until: Option<Timestamp>,
}

/// Password check with a failed-attempt lockout.
#[derive(Debug)]
pub struct AdminGate {
    password: Option<String>,
    max_attempts: u32,
    lockout_ms: u64,
    attempts: Mutex<Attempts>,
}

impl AdminGate {
    /// Create a gate. With no password configured every attempt is refused.
    pub fn new(password: Option<String>, max_attempts: u32, lockout_secs: u64) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
            max_attempts: max_attempts.max(1),
            lockout_ms: lockout_secs * MILLIS_PER_SECOND,
            attempts: Mutex::new(Attempts::default()),
        }
    }

    /// Check a presented password.
    ///
    /// After `max_attempts` consecutive failures the gate refuses every
    /// attempt, right or wrong, until the lockout window has passed.
    pub fn authorize(&self, presented: &str, now: Timestamp) -> Result<AdminGrant> {
        let mut attempts = self.attempts.lock();

        if let Some(until) = attempts.locked_until {
            if now < until {
                return Err(Error::LockedOut {
                    retry_after_secs: (until - now).div_ceil(MILLIS_PER_SECOND),
                });
            }
            attempts.locked_until = None;
            attempts.failures = 0;
        }

        let Some(expected) = self.password.as_deref() else {
            return Err(Error::Unauthorized);
        };

        if constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
            attempts.failures = 0;
            return Ok(AdminGrant { issued_at: now });
        }

        attempts.failures += 1;
        if attempts.failures >= self.max_attempts {
            attempts.locked_until = Some(now + self.lockout_ms);
            tracing::warn!(failures = attempts.failures, "Admin access locked");
        }
        Err(Error::Unauthorized)
    }

    /// Issue a grant without a password, for in-process operator tooling.
    pub fn trusted(now: Timestamp) -> AdminGrant {
        AdminGrant { issued_at: now }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
