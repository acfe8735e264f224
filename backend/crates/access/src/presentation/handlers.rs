//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use platform::client::extract_header_token;

use crate::application::{LoginInput, RequestContext};
use crate::domain::repository::AccessRepository;
use crate::error::{AccessError, AccessResult};
use crate::presentation::dto::{
    LoginRequest, LoginResponse, MeResponse, ReAuthStatusResponse, UserSummary,
    VerifyPasswordRequest, VerifyPasswordResponse,
};
use crate::presentation::extract::CurrentPrincipal;
use crate::presentation::state::{AccessAppState, STEP_UP_HEADER};

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AccessAppState<R>>,
    context: RequestContext,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AccessResult<Json<LoginResponse>>
where
    R: AccessRepository,
{
    let Json(req) = body.map_err(|e| AccessError::InvalidRequest(e.body_text()))?;

    let output = state
        .login()
        .execute(
            LoginInput {
                user_name: req.user_name,
                password: req.password,
            },
            &context,
        )
        .await?;

    Ok(Json(LoginResponse {
        expires_in: output.session.expires_in_secs(),
        expires_at: output.session.expires_at,
        token: output.session.token,
        user: UserSummary {
            id: output.user.user_id,
            user_name: output.user.user_name,
            role: output.user.role,
            store_id: output.user.store_id,
        },
    }))
}

// ============================================================================
// Step-up re-authentication
// ============================================================================

/// POST /api/auth/verify-password
pub async fn verify_password<R>(
    State(state): State<AccessAppState<R>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    context: RequestContext,
    body: Result<Json<VerifyPasswordRequest>, JsonRejection>,
) -> AccessResult<Json<VerifyPasswordResponse>>
where
    R: AccessRepository,
{
    // An unreadable body has no password in it.
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let issued = state
        .reauth_guard()
        .verify_password(&principal, req.password, &context)
        .await?;

    Ok(Json(VerifyPasswordResponse {
        expires_in: issued.expires_in_secs(),
        expires_at: issued.expires_at,
        re_auth_token: issued.token,
    }))
}

/// GET /api/auth/verify-password
///
/// Read-only: reports whether a sensitive action would currently need a
/// password confirmation.
pub async fn reauth_status<R>(
    State(state): State<AccessAppState<R>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    headers: HeaderMap,
) -> AccessResult<Json<ReAuthStatusResponse>>
where
    R: AccessRepository,
{
    let reauth_state = state
        .reauth_guard()
        .state(&principal, extract_header_token(&headers, STEP_UP_HEADER))
        .await?;

    Ok(Json(ReAuthStatusResponse {
        re_auth_required: !reauth_state.is_verified(),
        state: reauth_state,
    }))
}

// ============================================================================
// Current principal
// ============================================================================

/// GET /api/auth/me
pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<MeResponse> {
    Json(principal.into())
}
