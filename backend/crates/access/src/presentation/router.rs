//! Access Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::AccessConfig;
use crate::domain::repository::AccessRepository;
use crate::presentation::handlers;
use crate::presentation::middleware::require_session;
use crate::presentation::state::AccessAppState;

/// Create the access router (mounted at `/api/auth`) for any repository
/// implementation
pub fn access_router<R>(state: AccessAppState<R>) -> Router
where
    R: AccessRepository,
{
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route(
            "/verify-password",
            get(handlers::reauth_status::<R>).post(handlers::verify_password::<R>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<R>,
        ));

    Router::new()
        .route("/login", post(handlers::login::<R>))
        .merge(protected)
        .with_state(state)
}

/// Create the access router with the system clock
pub fn access_router_with<R>(repo: R, config: AccessConfig) -> Router
where
    R: AccessRepository,
{
    access_router(AccessAppState::new(repo, config))
}
