//! Re-Auth Guard
//!
//! Step-up re-authentication for sensitive operations.
//!
//! ```text
//! IDLE --sensitive op--> AWAITING_PASSWORD --correct password--> VERIFIED
//!                           |  ^                                   |
//!                           +--+ wrong password                    | issued_at + TTL
//!                              (lock after threshold)              v
//!                                                               EXPIRED (acts as IDLE)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::clock::Clock;
use serde::Serialize;
use serde_json::json;

use crate::application::attempt_tracker::AttemptTracker;
use crate::application::audit::{AuditRecorder, NewAuditEntry, RequestContext, actions};
use crate::application::credential::CredentialVerifier;
use crate::application::token_service::{IssuedToken, TokenService};
use crate::domain::repository::{AttemptStore, AuditStore, UserRepository};
use crate::domain::value_object::{
    Principal, SensitiveAction, SensitivityPolicy, StepUpClaims, TokenClaims,
};
use crate::error::{AccessError, AccessResult};

/// Where a principal stands with respect to step-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReAuthState {
    /// No step-up token
    Idle,
    /// Failed confirmations are on record
    #[serde(rename_all = "camelCase")]
    AwaitingPassword {
        remaining_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Verified { expires_at: DateTime<Utc> },
    /// The presented step-up token has run out
    Expired,
}

impl ReAuthState {
    pub fn is_verified(&self) -> bool {
        matches!(self, ReAuthState::Verified { .. })
    }
}

pub struct ReAuthGuard<R, V>
where
    R: UserRepository + AttemptStore + AuditStore,
    V: CredentialVerifier,
{
    users: Arc<R>,
    verifier: Arc<V>,
    tokens: Arc<TokenService>,
    tracker: AttemptTracker<R>,
    audit: Arc<AuditRecorder<R>>,
    sensitivity: SensitivityPolicy,
    clock: Arc<dyn Clock>,
}

impl<R, V> ReAuthGuard<R, V>
where
    R: UserRepository + AttemptStore + AuditStore,
    V: CredentialVerifier + Sync,
{
    pub fn new(
        users: Arc<R>,
        verifier: Arc<V>,
        tokens: Arc<TokenService>,
        tracker: AttemptTracker<R>,
        audit: Arc<AuditRecorder<R>>,
        sensitivity: SensitivityPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            verifier,
            tokens,
            tracker,
            audit,
            sensitivity,
            clock,
        }
    }

    /// Confirm the principal's password and issue a step-up token.
    ///
    /// A locked principal is rejected before the verifier runs.
    pub async fn verify_password(
        &self,
        principal: &Principal,
        password: Option<String>,
        context: &RequestContext,
    ) -> AccessResult<IssuedToken> {
        let password = password
            .filter(|p| !p.trim().is_empty())
            .ok_or(AccessError::PasswordRequired)?;

        if let Some(locked_until) = self.tracker.locked_until(&principal.id).await? {
            self.audit_user(
                principal,
                actions::LOCKOUT_REJECTED,
                json!({ "lockedUntil": locked_until }),
                context,
            )
            .await;
            return Err(AccessError::locked_out(locked_until, self.clock.now()));
        }

        let user = self
            .users
            .find_by_id(&principal.id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AccessError::Unauthenticated)?;

        if !self.verifier.verify(password, &user.password_hash).await {
            let outcome = self.tracker.record_failure(&principal.id).await?;

            self.audit_user(
                principal,
                actions::PASSWORD_REJECTED,
                json!({ "remainingAttempts": outcome.remaining_attempts }),
                context,
            )
            .await;
            if outcome.lock_engaged {
                self.audit_user(
                    principal,
                    actions::LOCKOUT_ENGAGED,
                    json!({ "lockedUntil": outcome.locked_until }),
                    context,
                )
                .await;
            }

            return Err(match outcome.locked_until {
                Some(locked_until) => AccessError::locked_out(locked_until, self.clock.now()),
                None => AccessError::InvalidCredentials {
                    remaining_attempts: outcome.remaining_attempts,
                },
            });
        }

        self.tracker.record_success(&principal.id).await?;
        let issued = self.tokens.issue_step_up(principal)?;

        tracing::info!(
            user_id = %principal.id,
            expires_at = %issued.expires_at,
            "Step-up token issued"
        );
        self.audit_user(
            principal,
            actions::PASSWORD_VERIFIED,
            json!({ "expiresAt": issued.expires_at }),
            context,
        )
        .await;

        Ok(issued)
    }

    /// Gate a sensitive action on a live step-up token bound to `principal`.
    pub async fn require_step_up(
        &self,
        principal: &Principal,
        step_up_token: Option<&str>,
        action: SensitiveAction,
        context: &RequestContext,
    ) -> AccessResult<StepUpClaims> {
        let claims = step_up_token.and_then(|token| self.tokens.validate_step_up(token));

        let bound = match claims {
            Some(claims) if claims.is_bound_to(principal) => Some(claims),
            Some(claims) => {
                tracing::warn!(
                    user_id = %principal.id,
                    token_user_id = %claims.user_id,
                    "Step-up token presented under another principal"
                );
                None
            }
            None => None,
        };

        let entry = |name: &str| {
            NewAuditEntry::new(principal.id, name, "sensitive_action", action.to_string())
                .with_context(context)
        };

        match bound {
            Some(claims) => {
                self.audit.record(entry(actions::STEP_UP_ACCEPTED)).await;
                Ok(claims)
            }
            None => {
                tracing::info!(user_id = %principal.id, %action, "Step-up required");
                self.audit.record(entry(actions::STEP_UP_REQUIRED)).await;
                Err(AccessError::ReAuthRequired { action })
            }
        }
    }

    /// Classify an operation and gate it when sensitive. Returns the step-up
    /// claims used, or `None` for ordinary operations.
    pub async fn guard_operation(
        &self,
        principal: &Principal,
        step_up_token: Option<&str>,
        tag: Option<SensitiveAction>,
        amount_cents: Option<i64>,
        context: &RequestContext,
    ) -> AccessResult<Option<StepUpClaims>> {
        match self.sensitivity.classify(tag, amount_cents) {
            Some(action) => self
                .require_step_up(principal, step_up_token, action, context)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    async fn audit_user(
        &self,
        principal: &Principal,
        action: &str,
        values: serde_json::Value,
        context: &RequestContext,
    ) {
        self.audit
            .record(
                NewAuditEntry::new(principal.id, action, "user", principal.id.to_string())
                    .with_change(None, Some(values))
                    .with_context(context),
            )
            .await;
    }

    /// Read-only view of the principal's step-up state.
    pub async fn state(
        &self,
        principal: &Principal,
        step_up_token: Option<&str>,
    ) -> AccessResult<ReAuthState> {
        let now_ms = self.clock.now().timestamp_millis();
        let mut expired = false;

        if let Some(TokenClaims::StepUp(claims)) =
            step_up_token.and_then(|token| self.tokens.decode(token))
        {
            if claims.is_bound_to(principal) {
                if now_ms < claims.expires_at_ms {
                    if let Some(expires_at) = DateTime::from_timestamp_millis(claims.expires_at_ms) {
                        return Ok(ReAuthState::Verified { expires_at });
                    }
                } else {
                    expired = true;
                }
            }
        }

        let failures = self.tracker.failure_count(&principal.id).await?;
        if failures > 0 {
            let locked_until = self.tracker.locked_until(&principal.id).await?;
            return Ok(ReAuthState::AwaitingPassword {
                remaining_attempts: if locked_until.is_some() {
                    0
                } else {
                    self.tracker.policy().threshold.saturating_sub(failures)
                },
                locked_until,
            });
        }

        Ok(if expired {
            ReAuthState::Expired
        } else {
            ReAuthState::Idle
        })
    }
}
