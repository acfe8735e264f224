//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (`infra::memory`, `infra::postgres`).

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::{AttemptRecord, AttemptUpdate, AuditEntry, LockoutPolicy, User};
use crate::error::{AccessResult, AuditError};

/// User lookup
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AccessResult<Option<User>>;

    /// Find user by login name (matched on its canonical form)
    async fn find_by_user_name(&self, user_name: &str) -> AccessResult<Option<User>>;
}

/// Per-user failure counters
///
/// Every method is atomic with respect to a single user id.
#[trait_variant::make(AttemptStore: Send)]
pub trait LocalAttemptStore {
    async fn get(&self, user_id: &UserId) -> AccessResult<Option<AttemptRecord>>;

    /// Apply one failure under `policy` as of `now`.
    async fn increment(
        &self,
        user_id: &UserId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AccessResult<AttemptUpdate>;

    /// Clear the counter and any lock.
    async fn reset(&self, user_id: &UserId) -> AccessResult<()>;

    /// Drop records whose lock window ended before `now`, and unlocked
    /// counters whose last failure is older than `idle_before`.
    async fn cleanup_expired(
        &self,
        now: DateTime<Utc>,
        idle_before: DateTime<Utc>,
    ) -> AccessResult<u64>;
}

/// Append-only audit log
#[trait_variant::make(AuditStore: Send)]
pub trait LocalAuditStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

/// Everything the access layer persists, behind one handle.
pub trait AccessRepository:
    UserRepository + AttemptStore + AuditStore + Send + Sync + 'static
{
}

impl<T> AccessRepository for T where
    T: UserRepository + AttemptStore + AuditStore + Send + Sync + 'static
{
}
