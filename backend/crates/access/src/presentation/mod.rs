//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use extract::CurrentPrincipal;
pub use middleware::require_session;
pub use router::{access_router, access_router_with};
pub use state::{AccessAppState, STEP_UP_HEADER};
