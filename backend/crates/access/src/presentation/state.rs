//! Shared handler state
//!
//! Long-lived services (token service, audit recorder) are built once;
//! use cases are assembled per request from them.

use std::sync::Arc;

use axum::http::HeaderMap;
use platform::client::{extract_bearer_token, extract_header_token};
use platform::clock::{Clock, SystemClock};

use crate::application::{
    AccessConfig, Argon2Verifier, AttemptTracker, AuditRecorder, AuthorizationService,
    LoginUseCase, NewAuditEntry, ReAuthGuard, RequestContext, TokenService,
};
use crate::domain::policy::Requirement;
use crate::domain::repository::AccessRepository;
use crate::domain::value_object::{Principal, SensitiveAction, StepUpClaims};
use crate::error::AccessResult;

/// Header carrying the step-up token on sensitive requests.
pub const STEP_UP_HEADER: &str = "x-reauth-token";

pub struct AccessAppState<R>
where
    R: AccessRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<AccessConfig>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<TokenService>,
    pub audit: Arc<AuditRecorder<R>>,
    pub verifier: Arc<Argon2Verifier>,
}

impl<R> Clone for AccessAppState<R>
where
    R: AccessRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            tokens: self.tokens.clone(),
            audit: self.audit.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

impl<R> AccessAppState<R>
where
    R: AccessRepository,
{
    pub fn new(repo: R, config: AccessConfig) -> Self {
        Self::with_clock(Arc::new(repo), Arc::new(config), Arc::new(SystemClock))
    }

    pub fn with_clock(repo: Arc<R>, config: Arc<AccessConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(config.clone(), clock.clone())),
            audit: Arc::new(AuditRecorder::new(repo.clone(), clock.clone())),
            verifier: Arc::new(Argon2Verifier::new(config.password_pepper.clone())),
            repo,
            config,
            clock,
        }
    }

    pub fn tracker(&self) -> AttemptTracker<R> {
        AttemptTracker::new(
            self.repo.clone(),
            self.config.lockout_policy(),
            self.clock.clone(),
        )
    }

    pub fn authorization(&self) -> AuthorizationService<R> {
        AuthorizationService::new(self.tokens.clone(), self.audit.clone())
    }

    pub fn reauth_guard(&self) -> ReAuthGuard<R, Argon2Verifier> {
        ReAuthGuard::new(
            self.repo.clone(),
            self.verifier.clone(),
            self.tokens.clone(),
            self.tracker(),
            self.audit.clone(),
            self.config.sensitivity_policy(),
            self.clock.clone(),
        )
    }

    pub fn login(&self) -> LoginUseCase<R, Argon2Verifier> {
        LoginUseCase::new(
            self.repo.clone(),
            self.verifier.clone(),
            self.tokens.clone(),
            self.tracker(),
            self.audit.clone(),
            self.clock.clone(),
        )
    }

    // ------------------------------------------------------------------------
    // Helpers for business handlers
    // ------------------------------------------------------------------------

    /// Authenticate the bearer session and check `requirement`.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        requirement: Requirement,
        context: &RequestContext,
    ) -> AccessResult<Principal> {
        self.authorization()
            .authorize(extract_bearer_token(headers), requirement, context)
            .await
    }

    /// Demand a live step-up token in [`STEP_UP_HEADER`].
    pub async fn require_step_up(
        &self,
        principal: &Principal,
        headers: &HeaderMap,
        action: SensitiveAction,
        context: &RequestContext,
    ) -> AccessResult<StepUpClaims> {
        self.reauth_guard()
            .require_step_up(
                principal,
                extract_header_token(headers, STEP_UP_HEADER),
                action,
                context,
            )
            .await
    }

    /// Classify the operation and demand step-up only when it is sensitive.
    pub async fn guard_operation(
        &self,
        principal: &Principal,
        headers: &HeaderMap,
        tag: Option<SensitiveAction>,
        amount_cents: Option<i64>,
        context: &RequestContext,
    ) -> AccessResult<Option<StepUpClaims>> {
        self.reauth_guard()
            .guard_operation(
                principal,
                extract_header_token(headers, STEP_UP_HEADER),
                tag,
                amount_cents,
                context,
            )
            .await
    }

    pub async fn record_audit(&self, entry: NewAuditEntry) {
        self.audit.record(entry).await;
    }
}
