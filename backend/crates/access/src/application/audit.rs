//! Audit Recorder
//!
//! Appends audit entries and absorbs storage failures: callers never see an
//! error, failed writes are logged under the `audit` target and counted.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kernel::id::{AuditEntryId, UserId};
use platform::clock::Clock;
use serde_json::Value;

use crate::domain::entity::AuditEntry;
use crate::domain::repository::AuditStore;

/// Action names written by the access layer itself.
pub mod actions {
    pub const AUTHORIZATION_GRANTED: &str = "authorization.granted";
    pub const AUTHORIZATION_DENIED: &str = "authorization.denied";
    pub const STEP_UP_REQUIRED: &str = "reauth.required";
    pub const STEP_UP_ACCEPTED: &str = "reauth.accepted";
    pub const PASSWORD_VERIFIED: &str = "reauth.verified";
    pub const PASSWORD_REJECTED: &str = "reauth.failed";
    pub const LOCKOUT_ENGAGED: &str = "lockout.engaged";
    pub const LOCKOUT_REJECTED: &str = "lockout.rejected";
    pub const LOGIN_SUCCEEDED: &str = "login.succeeded";
    pub const LOGIN_FAILED: &str = "login.failed";
}

/// Request-scoped details attached to audit entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: Option<IpAddr>,
}

impl RequestContext {
    pub fn new(ip_address: Option<IpAddr>) -> Self {
        Self { ip_address }
    }
}

/// An entry before the recorder stamps it.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<IpAddr>,
}

impl NewAuditEntry {
    pub fn new(
        user_id: UserId,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            old_values: None,
            new_values: None,
            ip_address: None,
        }
    }

    pub fn with_change(mut self, old_values: Option<Value>, new_values: Option<Value>) -> Self {
        self.old_values = old_values;
        self.new_values = new_values;
        self
    }

    pub fn with_context(mut self, context: &RequestContext) -> Self {
        self.ip_address = context.ip_address;
        self
    }
}

pub struct AuditRecorder<S>
where
    S: AuditStore,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    failed_writes: AtomicU64,
}

impl<S> AuditRecorder<S>
where
    S: AuditStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            failed_writes: AtomicU64::new(0),
        }
    }

    pub async fn record(&self, entry: NewAuditEntry) {
        let entry = AuditEntry {
            id: AuditEntryId::new(),
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            old_values: entry.old_values,
            new_values: entry.new_values,
            ip_address: entry.ip_address,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.store.append(&entry).await {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                target: "audit",
                error = %e,
                user_id = %entry.user_id,
                action = %entry.action,
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                "Failed to write audit entry"
            );
        }
    }

    /// Writes lost since startup
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}
