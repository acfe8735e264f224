//! In-Memory Repository
//!
//! Single-process backend for tests and database-less runs. Each map sits
//! behind its own async mutex, which is what makes attempt increments
//! atomic per user.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use tokio::sync::{Mutex, RwLock};

use crate::domain::entity::{AttemptRecord, AttemptUpdate, AuditEntry, LockoutPolicy, User};
use crate::domain::repository::{AttemptStore, AuditStore, UserRepository};
use crate::error::{AccessResult, AuditError};

#[derive(Default)]
struct Inner {
    users: RwLock<HashMap<UserId, User>>,
    attempts: Mutex<HashMap<UserId, AttemptRecord>>,
    audit_log: Mutex<Vec<AuditEntry>>,
}

/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryAccessRepository {
    inner: Arc<Inner>,
}

impl MemoryAccessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user
    pub async fn insert_user(&self, user: User) {
        self.inner.users.write().await.insert(user.user_id, user);
    }

    /// Snapshot of the audit log in append order
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.inner.audit_log.lock().await.clone()
    }
}

impl UserRepository for MemoryAccessRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AccessResult<Option<User>> {
        Ok(self.inner.users.read().await.get(user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> AccessResult<Option<User>> {
        let canonical = User::canonical_name(user_name);
        Ok(self
            .inner
            .users
            .read()
            .await
            .values()
            .find(|user| user.user_name_canonical() == canonical)
            .cloned())
    }
}

impl AttemptStore for MemoryAccessRepository {
    async fn get(&self, user_id: &UserId) -> AccessResult<Option<AttemptRecord>> {
        Ok(self.inner.attempts.lock().await.get(user_id).cloned())
    }

    async fn increment(
        &self,
        user_id: &UserId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AccessResult<AttemptUpdate> {
        let mut attempts = self.inner.attempts.lock().await;
        let record = attempts
            .entry(*user_id)
            .or_insert_with(|| AttemptRecord::new(*user_id));
        let lock_engaged = record.register_failure(policy, now);

        Ok(AttemptUpdate {
            record: record.clone(),
            lock_engaged,
        })
    }

    async fn reset(&self, user_id: &UserId) -> AccessResult<()> {
        self.inner.attempts.lock().await.remove(user_id);
        Ok(())
    }

    async fn cleanup_expired(
        &self,
        now: DateTime<Utc>,
        idle_before: DateTime<Utc>,
    ) -> AccessResult<u64> {
        let mut attempts = self.inner.attempts.lock().await;
        let before = attempts.len();
        attempts.retain(|_, record| !record.is_stale_at(now, idle_before));
        Ok((before - attempts.len()) as u64)
    }
}

impl AuditStore for MemoryAccessRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.inner.audit_log.lock().await.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::Role;
    use chrono::Duration;

    #[tokio::test]
    async fn test_find_by_user_name_is_case_insensitive() {
        let repo = MemoryAccessRepository::new();
        let user = User::new("Dana", Role::Admin, None, "$argon2id$stub");
        repo.insert_user(user.clone()).await;

        let found = repo.find_by_user_name(" DANA ").await.unwrap().unwrap();
        assert_eq!(found.user_id, user.user_id);
        assert!(repo.find_by_user_name("dan").await.unwrap().is_none());
        assert!(repo.find_by_id(&user.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_parallel_failures_engage_one_lock() {
        let repo = MemoryAccessRepository::new();
        let policy = LockoutPolicy::default();
        let user = UserId::new();
        let now = Utc::now();
        let attempts = 16;

        let handles: Vec<_> = (0..attempts)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment(&user, &policy, now).await.unwrap() })
            })
            .collect();

        let mut engaged = 0;
        for handle in handles {
            if handle.await.unwrap().lock_engaged {
                engaged += 1;
            }
        }

        let record = repo.get(&user).await.unwrap().unwrap();
        assert_eq!(engaged, 1);
        assert!(record.fail_count <= attempts);
        assert_eq!(record.locked_until, Some(now + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_reset_clears_record() {
        let repo = MemoryAccessRepository::new();
        let user = UserId::new();
        repo.increment(&user, &LockoutPolicy::default(), Utc::now())
            .await
            .unwrap();
        repo.reset(&user).await.unwrap();
        assert!(repo.get(&user).await.unwrap().is_none());
    }
}
