//! Signed token claims
//!
//! Session and step-up tokens share one wire format; the `typ` tag keeps a
//! token of one kind from ever deserializing as the other.

use kernel::id::{StoreId, UserId};
use serde::{Deserialize, Serialize};

use super::principal::Principal;
use super::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum TokenClaims {
    Session(SessionClaims),
    StepUp(StepUpClaims),
}

impl TokenClaims {
    pub fn expires_at_ms(&self) -> i64 {
        match self {
            TokenClaims::Session(claims) => claims.expires_at_ms,
            TokenClaims::StepUp(claims) => claims.expires_at_ms,
        }
    }

    /// Valid while `now < expires_at`.
    pub fn is_live_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms()
    }
}

/// Claims of a login session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: UserId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

impl SessionClaims {
    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.role, self.store_id)
    }
}

/// Claims of a step-up (re-authentication) token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpClaims {
    pub user_id: UserId,
    pub role: Role,
    pub re_auth: bool,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

impl StepUpClaims {
    /// Step-up tokens are bound to the principal they were issued for.
    pub fn is_bound_to(&self, principal: &Principal) -> bool {
        self.re_auth && self.user_id == principal.id && self.role == principal.role
    }
}
