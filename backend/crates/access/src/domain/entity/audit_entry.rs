//! Audit Entry Entity
//!
//! Append-only record of an authorization decision or sensitive action.

use chrono::{DateTime, Utc};
use kernel::id::{AuditEntryId, UserId};
use serde::Serialize;
use serde_json::Value;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditEntryId,
    /// Acting user
    pub user_id: UserId,
    /// Dotted action name, e.g. `check.void` or `authorization.denied`
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<IpAddr>,
    pub created_at: DateTime<Utc>,
}
