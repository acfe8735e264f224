//! Attempt Record Entity
//!
//! Consecutive password failures for one user and the lock they produce.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;

/// Lockout policy: `threshold` consecutive failures lock for `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub threshold: u32,
    pub duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: 3,
            duration: Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub user_id: UserId,
    pub fail_count: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            fail_count: 0,
            locked_until: None,
            last_failure_at: None,
        }
    }

    /// Locked while `now < locked_until`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// A lock was engaged and its window has passed.
    pub fn lock_elapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now >= until)
    }

    /// Apply one failure. Returns `true` when this failure engaged the lock.
    ///
    /// A failure after the lock window restarts the count at one. Once a lock
    /// is engaged further failures only raise the count, so concurrent
    /// failures produce a single lock transition.
    pub fn register_failure(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        if self.lock_elapsed_at(now) {
            self.fail_count = 0;
            self.locked_until = None;
        }

        self.fail_count = self.fail_count.saturating_add(1);
        self.last_failure_at = Some(now);

        let engaged = self.locked_until.is_none() && self.fail_count >= policy.threshold;
        if engaged {
            let until = now
                .checked_add_signed(policy.duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.locked_until = Some(until);
        }
        engaged
    }

    /// Eligible for cleanup: the lock window has passed, or there is no lock
    /// and the last failure happened before `idle_before`.
    pub fn is_stale_at(&self, now: DateTime<Utc>, idle_before: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(_) => self.lock_elapsed_at(now),
            None => self.last_failure_at.is_none_or(|at| at < idle_before),
        }
    }

    pub fn remaining_attempts(&self, policy: &LockoutPolicy) -> u32 {
        policy.threshold.saturating_sub(self.fail_count)
    }
}

/// Result of an atomic increment in an attempt store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptUpdate {
    pub record: AttemptRecord,
    pub lock_engaged: bool,
}
