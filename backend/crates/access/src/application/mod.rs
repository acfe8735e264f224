//! Application Layer
//!
//! Use cases and application services.

pub mod attempt_tracker;
pub mod audit;
pub mod authorization;
pub mod config;
pub mod credential;
pub mod login;
pub mod reauth_guard;
pub mod token_service;

// Re-exports
pub use attempt_tracker::{AttemptTracker, FailureOutcome};
pub use audit::{AuditRecorder, NewAuditEntry, RequestContext};
pub use authorization::AuthorizationService;
pub use config::{AccessConfig, ConfigError};
pub use credential::{Argon2Verifier, CredentialVerifier};
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use reauth_guard::{ReAuthGuard, ReAuthState};
pub use token_service::{IssuedToken, TokenService};
