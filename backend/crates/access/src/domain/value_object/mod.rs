//! Value Object Module

pub mod permission;
pub mod principal;
pub mod role;
pub mod sensitive_action;
pub mod token_claims;

pub use permission::Permission;
pub use principal::Principal;
pub use role::Role;
pub use sensitive_action::{SensitiveAction, SensitivityPolicy};
pub use token_claims::{SessionClaims, StepUpClaims, TokenClaims};
