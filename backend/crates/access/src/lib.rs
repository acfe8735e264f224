//! Access control and step-up re-authentication
//!
//! Clean Architecture structure:
//! - `domain/` - Roles, permissions, token claims, RBAC policy, repository traits
//! - `application/` - Token service, attempt tracker, re-auth guard, audit recorder
//! - `infra/` - In-memory and PostgreSQL storage
//! - `presentation/` - HTTP handlers, extractors, middleware, router
//!
//! ## Features
//! - Stateless HMAC-signed session tokens (`Authorization: Bearer`)
//! - Role hierarchy `USER < MANAGER < ADMIN` with a static permission table
//! - Step-up tokens for sensitive actions (`X-Reauth-Token`), valid 5 minutes
//! - Lockout after 3 consecutive password failures
//! - Append-only audit trail of every authorization decision
//!
//! ## Security Model
//! - Passwords verified with Argon2id on the blocking pool, failing closed
//! - A locked account is refused before its password is checked
//! - Step-up tokens are bound to the user and role they were issued to

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{AccessConfig, RequestContext};
pub use domain::policy::Requirement;
pub use domain::value_object::{Permission, Principal, Role, SensitiveAction};
pub use error::{AccessError, AccessResult, AuditError};
pub use infra::{MemoryAccessRepository, PgAccessRepository};
pub use presentation::{AccessAppState, CurrentPrincipal, STEP_UP_HEADER, access_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
