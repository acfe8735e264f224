//! Attempt Tracker
//!
//! Lockout policy over an [`AttemptStore`]. The store does the atomic part;
//! the tracker supplies the policy and the clock and reports outcomes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::clock::Clock;

use crate::domain::entity::LockoutPolicy;
use crate::domain::repository::AttemptStore;
use crate::error::AccessResult;

/// Unlocked counters with no failure for this long are dropped by cleanup.
pub const IDLE_RETENTION: Duration = Duration::hours(24);

/// What one recorded failure did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub locked: bool,
    pub remaining_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    /// This failure is the one that engaged the lock
    pub lock_engaged: bool,
}

pub struct AttemptTracker<S>
where
    S: AttemptStore,
{
    store: Arc<S>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl<S> AttemptTracker<S>
where
    S: AttemptStore,
{
    pub fn new(store: Arc<S>, policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub async fn record_failure(&self, user_id: &UserId) -> AccessResult<FailureOutcome> {
        let now = self.clock.now();
        let update = self.store.increment(user_id, &self.policy, now).await?;
        let record = update.record;
        let locked = record.is_locked_at(now);

        if update.lock_engaged {
            tracing::warn!(
                user_id = %user_id,
                fail_count = record.fail_count,
                locked_until = ?record.locked_until,
                "Lockout engaged after consecutive failures"
            );
        } else {
            tracing::debug!(user_id = %user_id, fail_count = record.fail_count, "Failure recorded");
        }

        Ok(FailureOutcome {
            locked,
            remaining_attempts: if locked {
                0
            } else {
                record.remaining_attempts(&self.policy)
            },
            locked_until: record.locked_until.filter(|_| locked),
            lock_engaged: update.lock_engaged,
        })
    }

    pub async fn record_success(&self, user_id: &UserId) -> AccessResult<()> {
        self.store.reset(user_id).await
    }

    /// End of the current lock, if one is in force.
    pub async fn locked_until(&self, user_id: &UserId) -> AccessResult<Option<DateTime<Utc>>> {
        let now = self.clock.now();
        Ok(self
            .store
            .get(user_id)
            .await?
            .filter(|record| record.is_locked_at(now))
            .and_then(|record| record.locked_until))
    }

    pub async fn is_locked(&self, user_id: &UserId) -> AccessResult<bool> {
        Ok(self.locked_until(user_id).await?.is_some())
    }

    /// Failures recorded since the last success or lock expiry.
    pub async fn failure_count(&self, user_id: &UserId) -> AccessResult<u32> {
        let now = self.clock.now();
        Ok(self
            .store
            .get(user_id)
            .await?
            .filter(|record| !record.lock_elapsed_at(now))
            .map_or(0, |record| record.fail_count))
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Drop records whose lock window has elapsed, and counters idle for
    /// longer than [`IDLE_RETENTION`].
    pub async fn cleanup_expired(&self) -> AccessResult<u64> {
        let now = self.clock.now();
        self.store.cleanup_expired(now, now - IDLE_RETENTION).await
    }
}
