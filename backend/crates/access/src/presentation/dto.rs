//! Data Transfer Objects
//!
//! Request and response types for the HTTP API.

use chrono::{DateTime, Utc};
use kernel::id::{StoreId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::reauth_guard::ReAuthState;
use crate::domain::value_object::{Permission, Principal, Role};

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the session expires
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub user_name: String,
    pub role: Role,
    pub store_id: Option<StoreId>,
}

// ============================================================================
// Step-up re-authentication
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct VerifyPasswordRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPasswordResponse {
    pub re_auth_token: String,
    /// Seconds until the step-up token expires
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// `expiresAt` is present once verified; the flattened state carries it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReAuthStatusResponse {
    pub re_auth_required: bool,
    #[serde(flatten)]
    pub state: ReAuthState,
}

// ============================================================================
// Current principal
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: UserId,
    pub role: Role,
    pub store_id: Option<StoreId>,
    pub permissions: Vec<Permission>,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            role: principal.role,
            store_id: principal.store_id,
            permissions: principal.permissions().to_vec(),
        }
    }
}
