//! Authorization
//!
//! Turns a bearer token into a [`Principal`] and checks it against a
//! [`Requirement`]. Every decision reached with a valid session is audited.

use std::sync::Arc;

use crate::application::audit::{AuditRecorder, NewAuditEntry, RequestContext, actions};
use crate::application::token_service::TokenService;
use crate::domain::policy::Requirement;
use crate::domain::repository::AuditStore;
use crate::domain::value_object::Principal;
use crate::error::{AccessError, AccessResult};

pub struct AuthorizationService<S>
where
    S: AuditStore,
{
    tokens: Arc<TokenService>,
    audit: Arc<AuditRecorder<S>>,
}

impl<S> AuthorizationService<S>
where
    S: AuditStore,
{
    pub fn new(tokens: Arc<TokenService>, audit: Arc<AuditRecorder<S>>) -> Self {
        Self { tokens, audit }
    }

    /// Resolve the session token. Missing and invalid tokens are the same
    /// failure.
    pub fn authenticate(&self, session_token: Option<&str>) -> AccessResult<Principal> {
        session_token
            .and_then(|token| self.tokens.validate_session(token))
            .map(|claims| claims.principal())
            .ok_or(AccessError::Unauthenticated)
    }

    /// Authenticate, then check `requirement`.
    pub async fn authorize(
        &self,
        session_token: Option<&str>,
        requirement: Requirement,
        context: &RequestContext,
    ) -> AccessResult<Principal> {
        let principal = self.authenticate(session_token)?;
        self.check(&principal, requirement, context).await?;
        Ok(principal)
    }

    /// Check an already authenticated principal.
    pub async fn check(
        &self,
        principal: &Principal,
        requirement: Requirement,
        context: &RequestContext,
    ) -> AccessResult<()> {
        let decision = requirement.check(principal);

        let action = if decision.is_ok() {
            actions::AUTHORIZATION_GRANTED
        } else {
            tracing::warn!(
                user_id = %principal.id,
                role = %principal.role,
                requirement = %requirement.label(),
                "Authorization denied"
            );
            actions::AUTHORIZATION_DENIED
        };

        self.audit
            .record(
                NewAuditEntry::new(principal.id, action, "requirement", requirement.label())
                    .with_change(None, Some(serde_json::json!({ "role": principal.role })))
                    .with_context(context),
            )
            .await;

        decision
    }
}
