//! Access Middleware
//!
//! Middleware for requiring a session on protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;

use crate::domain::repository::AccessRepository;
use crate::error::AccessError;
use crate::presentation::state::AccessAppState;

/// Reject requests without a valid session token; otherwise store the
/// [`Principal`](crate::domain::value_object::Principal) in the request
/// extensions for [`CurrentPrincipal`](super::extract::CurrentPrincipal).
pub async fn require_session<R>(
    State(state): State<AccessAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccessError>
where
    R: AccessRepository,
{
    let principal = state
        .authorization()
        .authenticate(extract_bearer_token(req.headers()))?;

    tracing::debug!(user_id = %principal.id, role = %principal.role, "Session accepted");
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
