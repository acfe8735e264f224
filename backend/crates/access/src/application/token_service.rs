//! Token Service
//!
//! Issues and validates session and step-up tokens.
//!
//! Wire format: `base64url(json claims) "." base64url(HMAC-SHA256(secret, first part))`.
//! The server keeps no token state; expiry is embedded in the claims and
//! evaluated against the injected clock at validation time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::clock::Clock;
use platform::crypto::{from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};

use crate::application::config::AccessConfig;
use crate::domain::value_object::{Principal, SessionClaims, StepUpClaims, TokenClaims};
use crate::error::{AccessError, AccessResult};

/// A freshly signed token and its lifetime.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds from issuance to expiry
    pub fn expires_in_secs(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

pub struct TokenService {
    config: Arc<AccessConfig>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: Arc<AccessConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn issue_session(&self, principal: &Principal) -> AccessResult<IssuedToken> {
        let issued_at_ms = self.now_ms();
        let claims = TokenClaims::Session(SessionClaims {
            user_id: principal.id,
            role: principal.role,
            store_id: principal.store_id,
            issued_at_ms,
            expires_at_ms: expiry(issued_at_ms, self.config.session_ttl_ms())?,
        });
        self.sign(&claims, issued_at_ms)
    }

    pub fn issue_step_up(&self, principal: &Principal) -> AccessResult<IssuedToken> {
        let issued_at_ms = self.now_ms();
        let claims = TokenClaims::StepUp(StepUpClaims {
            user_id: principal.id,
            role: principal.role,
            re_auth: true,
            issued_at_ms,
            expires_at_ms: expiry(issued_at_ms, self.config.step_up_ttl_ms())?,
        });
        self.sign(&claims, issued_at_ms)
    }

    /// Verify signature and expiry. Malformed, forged and expired tokens all
    /// yield `None`.
    pub fn validate(&self, token: &str) -> Option<TokenClaims> {
        let claims = self.decode(token)?;
        claims.is_live_at(self.now_ms()).then_some(claims)
    }

    pub fn validate_session(&self, token: &str) -> Option<SessionClaims> {
        match self.validate(token)? {
            TokenClaims::Session(claims) => Some(claims),
            TokenClaims::StepUp(_) => None,
        }
    }

    pub fn validate_step_up(&self, token: &str) -> Option<StepUpClaims> {
        match self.validate(token)? {
            TokenClaims::StepUp(claims) if claims.re_auth => Some(claims),
            _ => None,
        }
    }

    /// Signature check only; the caller decides what expiry means.
    pub(crate) fn decode(&self, token: &str) -> Option<TokenClaims> {
        let (payload, signature) = token.split_once('.')?;
        let signature = from_base64url(signature).ok()?;
        if !verify_hmac_sha256(&self.config.token_secret, payload.as_bytes(), &signature) {
            return None;
        }
        let json = from_base64url(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    fn sign(&self, claims: &TokenClaims, issued_at_ms: i64) -> AccessResult<IssuedToken> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| AccessError::Internal(format!("Failed to encode claims: {e}")))?;
        let payload = to_base64url(&json);
        let signature = hmac_sha256(&self.config.token_secret, payload.as_bytes());

        Ok(IssuedToken {
            token: format!("{payload}.{}", to_base64url(&signature)),
            issued_at: from_millis(issued_at_ms)?,
            expires_at: from_millis(claims.expires_at_ms())?,
        })
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

fn expiry(issued_at_ms: i64, ttl_ms: i64) -> AccessResult<i64> {
    issued_at_ms
        .checked_add(ttl_ms)
        .ok_or_else(|| AccessError::Internal("token expiry out of range".into()))
}

fn from_millis(ms: i64) -> AccessResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AccessError::Internal(format!("Timestamp out of range: {ms}")))
}
