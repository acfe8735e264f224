//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{StoreId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{AttemptRecord, AttemptUpdate, AuditEntry, LockoutPolicy, User};
use crate::domain::repository::{AttemptStore, AuditStore, UserRepository};
use crate::domain::value_object::Role;
use crate::error::{AccessError, AccessResult, AuditError};

/// PostgreSQL-backed access repository
#[derive(Clone)]
pub struct PgAccessRepository {
    pool: PgPool,
}

impl PgAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user, or update it when the id already exists
    pub async fn upsert_user(&self, user: &User) -> AccessResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_users (
                user_id,
                user_name,
                user_name_canonical,
                user_role,
                store_id,
                password_hash,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                user_name = EXCLUDED.user_name,
                user_name_canonical = EXCLUDED.user_name_canonical,
                user_role = EXCLUDED.user_role,
                store_id = EXCLUDED.store_id,
                password_hash = EXCLUDED.password_hash,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.user_name)
        .bind(user.user_name_canonical())
        .bind(user.role.id())
        .bind(user.store_id.map(StoreId::into_uuid))
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAccessRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AccessResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_role,
                store_id,
                password_hash,
                is_active,
                created_at,
                updated_at
            FROM access_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_user_name(&self, user_name: &str) -> AccessResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_role,
                store_id,
                password_hash,
                is_active,
                created_at,
                updated_at
            FROM access_users
            WHERE user_name_canonical = $1
            "#,
        )
        .bind(User::canonical_name(user_name))
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }
}

// ============================================================================
// Attempt Store Implementation
// ============================================================================

impl AttemptStore for PgAccessRepository {
    async fn get(&self, user_id: &UserId) -> AccessResult<Option<AttemptRecord>> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT user_id, fail_count, locked_until_ms, updated_at_ms
            FROM access_attempts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttemptRow::into_record).transpose()
    }

    /// One statement, so the row lock taken by `ON CONFLICT DO UPDATE`
    /// serializes concurrent failures for the same user. All `a.` columns in
    /// the SET list read the pre-update row.
    async fn increment(
        &self,
        user_id: &UserId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AccessResult<AttemptUpdate> {
        let now_ms = now.timestamp_millis();
        let lock_until_ms = now
            .checked_add_signed(policy.duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .timestamp_millis();
        let threshold = i32::try_from(policy.threshold).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, IncrementRow>(
            r#"
            INSERT INTO access_attempts AS a (
                user_id,
                fail_count,
                locked_until_ms,
                lock_engaged,
                updated_at_ms
            ) VALUES (
                $1,
                1,
                CASE WHEN 1 >= $3 THEN $4::BIGINT END,
                1 >= $3,
                $2
            )
            ON CONFLICT (user_id) DO UPDATE SET
                fail_count = CASE
                    WHEN a.locked_until_ms <= $2 THEN 1
                    ELSE a.fail_count + 1
                END,
                locked_until_ms = CASE
                    WHEN a.locked_until_ms <= $2 THEN
                        CASE WHEN 1 >= $3 THEN $4::BIGINT END
                    WHEN a.locked_until_ms IS NULL AND a.fail_count + 1 >= $3 THEN $4::BIGINT
                    ELSE a.locked_until_ms
                END,
                lock_engaged = CASE
                    WHEN a.locked_until_ms <= $2 THEN 1 >= $3
                    ELSE a.locked_until_ms IS NULL AND a.fail_count + 1 >= $3
                END,
                updated_at_ms = $2
            RETURNING user_id, fail_count, locked_until_ms, lock_engaged, updated_at_ms
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now_ms)
        .bind(threshold)
        .bind(lock_until_ms)
        .fetch_one(&self.pool)
        .await?;

        row.into_update()
    }

    async fn reset(&self, user_id: &UserId) -> AccessResult<()> {
        sqlx::query("DELETE FROM access_attempts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(
        &self,
        now: DateTime<Utc>,
        idle_before: DateTime<Utc>,
    ) -> AccessResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM access_attempts
            WHERE locked_until_ms <= $1
               OR (locked_until_ms IS NULL AND updated_at_ms < $2)
            "#,
        )
        .bind(now.timestamp_millis())
        .bind(idle_before.timestamp_millis())
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(attempts_deleted = deleted, "Cleaned up stale attempt records");

        Ok(deleted)
    }
}

// ============================================================================
// Audit Store Implementation
// ============================================================================

impl AuditStore for PgAccessRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                audit_entry_id,
                user_id,
                action,
                entity_type,
                entity_id,
                old_values,
                new_values,
                ip_address,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8::inet, $9)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.user_id.as_uuid())
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(entry.ip_address.map(|ip| ip.to_string()))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    user_role: i16,
    store_id: Option<Uuid>,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AccessResult<User> {
        let role = Role::from_id(self.user_role)
            .ok_or_else(|| AccessError::Internal(format!("Invalid user_role: {}", self.user_role)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: self.user_name,
            role,
            store_id: self.store_id.map(StoreId::from_uuid),
            password_hash: self.password_hash,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    user_id: Uuid,
    fail_count: i32,
    locked_until_ms: Option<i64>,
    updated_at_ms: i64,
}

impl AttemptRow {
    fn into_record(self) -> AccessResult<AttemptRecord> {
        let locked_until = self
            .locked_until_ms
            .map(|ms| {
                DateTime::from_timestamp_millis(ms)
                    .ok_or_else(|| AccessError::Internal(format!("Invalid locked_until_ms: {ms}")))
            })
            .transpose()?;

        Ok(AttemptRecord {
            user_id: UserId::from_uuid(self.user_id),
            fail_count: u32::try_from(self.fail_count).unwrap_or(0),
            locked_until,
            last_failure_at: DateTime::from_timestamp_millis(self.updated_at_ms),
        })
    }
}

#[derive(sqlx::FromRow)]
struct IncrementRow {
    user_id: Uuid,
    fail_count: i32,
    locked_until_ms: Option<i64>,
    lock_engaged: bool,
    updated_at_ms: i64,
}

impl IncrementRow {
    fn into_update(self) -> AccessResult<AttemptUpdate> {
        let lock_engaged = self.lock_engaged;
        let record = AttemptRow {
            user_id: self.user_id,
            fail_count: self.fail_count,
            locked_until_ms: self.locked_until_ms,
            updated_at_ms: self.updated_at_ms,
        }
        .into_record()?;

        Ok(AttemptUpdate {
            record,
            lock_engaged,
        })
    }
}
