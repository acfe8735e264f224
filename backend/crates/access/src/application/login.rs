//! Login Use Case
//!
//! Exchanges a user name and password for a session token. Failures feed the
//! same attempt tracker as step-up confirmation: one counter per user, so
//! three bad logins also block step-up for the lock window. A locked account
//! answers `LOCKED_OUT` even here, which confirms the name exists; wrong
//! passwords and unknown names stay indistinguishable until then.

use std::sync::Arc;

use platform::clock::Clock;
use serde_json::json;

use crate::application::attempt_tracker::AttemptTracker;
use crate::application::audit::{AuditRecorder, NewAuditEntry, RequestContext, actions};
use crate::application::credential::CredentialVerifier;
use crate::application::token_service::{IssuedToken, TokenService};
use crate::domain::entity::User;
use crate::domain::repository::{AttemptStore, AuditStore, UserRepository};
use crate::error::{AccessError, AccessResult};

pub struct LoginInput {
    pub user_name: String,
    pub password: String,
}

pub struct LoginOutput {
    pub user: User,
    pub session: IssuedToken,
}

pub struct LoginUseCase<R, V>
where
    R: UserRepository + AttemptStore + AuditStore,
    V: CredentialVerifier,
{
    users: Arc<R>,
    verifier: Arc<V>,
    tokens: Arc<TokenService>,
    tracker: AttemptTracker<R>,
    audit: Arc<AuditRecorder<R>>,
    clock: Arc<dyn Clock>,
}

impl<R, V> LoginUseCase<R, V>
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
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            verifier,
            tokens,
            tracker,
            audit,
            clock,
        }
    }

    pub async fn execute(
        &self,
        input: LoginInput,
        context: &RequestContext,
    ) -> AccessResult<LoginOutput> {
        if input.user_name.trim().is_empty() || input.password.is_empty() {
            return Err(AccessError::LoginFailed);
        }

        // Unknown and disabled accounts look like a wrong password.
        let user = self
            .users
            .find_by_user_name(&input.user_name)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AccessError::LoginFailed)?;

        if let Some(locked_until) = self.tracker.locked_until(&user.user_id).await? {
            self.audit_login(&user, actions::LOCKOUT_REJECTED, context).await;
            return Err(AccessError::locked_out(locked_until, self.clock.now()));
        }

        if !self.verifier.verify(input.password, &user.password_hash).await {
            let outcome = self.tracker.record_failure(&user.user_id).await?;
            self.audit_login(&user, actions::LOGIN_FAILED, context).await;
            if outcome.lock_engaged {
                self.audit_login(&user, actions::LOCKOUT_ENGAGED, context).await;
            }
            return Err(match outcome.locked_until {
                Some(locked_until) => AccessError::locked_out(locked_until, self.clock.now()),
                None => AccessError::LoginFailed,
            });
        }

        self.tracker.record_success(&user.user_id).await?;
        let session = self.tokens.issue_session(&user.principal())?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "User logged in");
        self.audit_login(&user, actions::LOGIN_SUCCEEDED, context).await;

        Ok(LoginOutput { user, session })
    }

    async fn audit_login(&self, user: &User, action: &str, context: &RequestContext) {
        self.audit
            .record(
                NewAuditEntry::new(user.user_id, action, "user", user.user_id.to_string())
                    .with_change(None, Some(json!({ "userName": user.user_name })))
                    .with_context(context),
            )
            .await;
    }
}
